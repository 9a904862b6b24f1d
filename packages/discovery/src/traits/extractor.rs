//! Entity extractor trait.
//!
//! Extraction providers turn raw page text into candidate entities.
//! They are treated as unreliable: a provider may be down, return
//! malformed JSON, or return nothing. The pipeline runs them as an
//! ordered fallback chain (see `extract::ExtractorChain`) ending in a
//! local heuristic that cannot fail.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::entity::Entity;

/// One entity-extraction strategy.
///
/// # Implementations
///
/// - `FastinoExtractor` - Fastino classification API
/// - `RekaExtractor` - Reka chat API
/// - `KeywordExtractor` - local heuristic, never fails
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Short provider name for logging and progress events.
    fn name(&self) -> &'static str;

    /// Extract candidate entities from page text.
    ///
    /// The text has already been truncated to the pipeline's character
    /// budget. Implementations may return an empty list; the chain
    /// treats that the same as an error and falls through.
    async fn extract(&self, text: &str) -> Result<Vec<Entity>>;
}
