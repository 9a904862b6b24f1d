//! Typed errors for the discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Content search provider failed
    #[error("search failed: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Entity extraction provider unavailable or failed
    #[error("extraction provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Raw HTTP fetch failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider rejected the configured credentials
    #[error("invalid API key for {provider}")]
    Auth { provider: String },

    /// Provider rate limit exceeded
    #[error("rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Page fetch produced no usable content
    #[error("no content at: {url}")]
    EmptyContent { url: String },

    /// Provider response did not match the expected shape
    #[error("malformed provider response: {reason}")]
    MalformedResponse { reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Registry source could not be read
    #[error("registry error: {0}")]
    Registry(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Graph sink operation failed
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Job queue is full
    #[error("worker pool saturated")]
    PoolSaturated,

    /// Worker pool has shut down
    #[error("worker pool closed")]
    PoolClosed,

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur writing to the graph persistence sink.
///
/// Kept separate from [`DiscoveryError`] because sink writes are
/// best-effort: the orchestrator logs these and keeps going.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Transport failure reaching the sink
    #[error("sink transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Sink rejected the credentials
    #[error("sink auth rejected")]
    Auth,

    /// Statement failed server-side
    #[error("sink query failed: {message}")]
    Query { message: String },
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;
