//! Environment-driven configuration.
//!
//! Everything is optional: a missing provider key disables that
//! provider rather than failing startup, so a bare `ScoutConfig`
//! still yields a working keyword-only pipeline. Only malformed
//! values (a timeout that isn't a number) are errors.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::engine::DEFAULT_RESEARCH_CONCURRENCY;
use crate::error::{DiscoveryError, Result};
use crate::pool::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};

const DEFAULT_TAVILY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FASTINO_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REKA_TIMEOUT_SECS: u64 = 60;

/// Settings for one HTTP provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API key; the provider is disabled when unset
    pub api_key: Option<SecretString>,

    /// Base URL override (proxies, test servers)
    pub base_url: Option<String>,

    /// Request timeout
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Whether the provider has a key and can be wired up.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    /// HTTP endpoint; the sink is disabled when unset
    pub uri: Option<String>,

    pub user: String,

    pub password: Option<SecretString>,

    pub database: String,
}

impl Neo4jSettings {
    /// Whether the sink has enough settings to connect.
    pub fn is_configured(&self) -> bool {
        self.uri.is_some() && self.password.is_some()
    }
}

/// Discovery configuration read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `TAVILY_API_KEY` / `FASTINO_API_KEY` / `REKA_API_KEY` | unset (provider disabled) |
/// | `TAVILY_BASE_URL` / `FASTINO_BASE_URL` / `REKA_BASE_URL` | provider default |
/// | `TAVILY_TIMEOUT_SECS` / `FASTINO_TIMEOUT_SECS` / `REKA_TIMEOUT_SECS` | 30 / 15 / 60 |
/// | `NEO4J_URI`, `NEO4J_PASSWORD` | unset (sink disabled) |
/// | `NEO4J_USER`, `NEO4J_DATABASE` | `neo4j` |
/// | `TOOL_CATALOG_PATH`, `INTEGRATIONS_DIR` | unset (registry disabled) |
/// | `RESEARCH_CONCURRENCY` | 4 |
/// | `POOL_WORKERS`, `POOL_QUEUE_CAPACITY` | 2, 32 |
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub tavily: ProviderSettings,
    pub fastino: ProviderSettings,
    pub reka: ProviderSettings,
    pub neo4j: Neo4jSettings,

    /// Flat file listing already-integrated tools
    pub catalog_path: Option<PathBuf>,

    /// Directory whose children are integration modules
    pub integrations_dir: Option<PathBuf>,

    pub research_concurrency: usize,
    pub pool_workers: usize,
    pub pool_queue_capacity: usize,
}

impl ScoutConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tavily: provider_settings("TAVILY", DEFAULT_TAVILY_TIMEOUT_SECS)?,
            fastino: provider_settings("FASTINO", DEFAULT_FASTINO_TIMEOUT_SECS)?,
            reka: provider_settings("REKA", DEFAULT_REKA_TIMEOUT_SECS)?,
            neo4j: Neo4jSettings {
                uri: non_empty_var("NEO4J_URI"),
                user: non_empty_var("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string()),
                password: non_empty_var("NEO4J_PASSWORD").map(SecretString::from),
                database: non_empty_var("NEO4J_DATABASE").unwrap_or_else(|| "neo4j".to_string()),
            },
            catalog_path: non_empty_var("TOOL_CATALOG_PATH").map(PathBuf::from),
            integrations_dir: non_empty_var("INTEGRATIONS_DIR").map(PathBuf::from),
            research_concurrency: parsed_var("RESEARCH_CONCURRENCY", DEFAULT_RESEARCH_CONCURRENCY)?,
            pool_workers: parsed_var("POOL_WORKERS", DEFAULT_WORKERS)?,
            pool_queue_capacity: parsed_var("POOL_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
        })
    }
}

/// Read `{prefix}_API_KEY`, `{prefix}_BASE_URL`, `{prefix}_TIMEOUT_SECS`.
fn provider_settings(prefix: &str, default_timeout_secs: u64) -> Result<ProviderSettings> {
    let timeout_secs = parsed_var(&format!("{prefix}_TIMEOUT_SECS"), default_timeout_secs)?;
    Ok(ProviderSettings {
        api_key: non_empty_var(&format!("{prefix}_API_KEY")).map(SecretString::from),
        base_url: non_empty_var(&format!("{prefix}_BASE_URL")),
        timeout: Duration::from_secs(timeout_secs),
    })
}

/// An env var, with empty values treated as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an env var, falling back to `default` when unset.
fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| DiscoveryError::Config(format!("{name} invalid: {e}").into())),
        None => Ok(default),
    }
}
