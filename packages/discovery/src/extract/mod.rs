//! Entity extraction: provider adapters and the fallback chain.
//!
//! Extraction runs as a cascade. AI providers are tried in order
//! (Fastino first, then Reka); a provider that errors or returns an
//! empty list falls through to the next. The regex-based
//! [`KeywordExtractor`] is the terminal step and always produces an
//! answer, so the chain as a whole never fails.

pub mod fastino;
pub mod keyword;
pub mod prompts;
pub mod reka;

pub use fastino::FastinoExtractor;
pub use keyword::KeywordExtractor;
pub use reka::RekaExtractor;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{DiscoveryError, Result};
use crate::traits::extractor::EntityExtractor;
use crate::types::entity::{Entity, EntityKind};

/// Page text beyond this many chars is truncated before extraction.
pub const EXTRACT_CHAR_BUDGET: usize = 12_000;

/// Ordered cascade of entity extractors with a built-in keyword fallback.
///
/// Providers are consulted in registration order; the first one that
/// returns a non-empty entity list wins. The keyword scanner runs when
/// every provider has failed or found nothing.
pub struct ExtractorChain {
    providers: Vec<Arc<dyn EntityExtractor>>,
    fallback: KeywordExtractor,
}

impl ExtractorChain {
    /// Create a chain with no AI providers (keyword scanning only).
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            fallback: KeywordExtractor::new(),
        }
    }

    /// Append a provider to the cascade.
    pub fn with_provider(mut self, provider: Arc<dyn EntityExtractor>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of AI providers registered (the fallback is not counted).
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Provider names in cascade order, fallback excluded.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Extract entities from page text.
    ///
    /// Never fails: provider errors are logged and the cascade moves
    /// on, ending at the keyword scanner.
    pub async fn extract(&self, text: &str) -> Vec<Entity> {
        let text = truncate_chars(text, EXTRACT_CHAR_BUDGET);

        for provider in &self.providers {
            match provider.extract(text).await {
                Ok(entities) if !entities.is_empty() => {
                    tracing::debug!(
                        provider = provider.name(),
                        count = entities.len(),
                        "entities extracted"
                    );
                    return entities;
                }
                Ok(_) => {
                    tracing::debug!(
                        provider = provider.name(),
                        "extractor found nothing, trying next"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "extractor failed, trying next"
                    );
                }
            }
        }

        self.fallback.scan(text)
    }
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse duplicate entities case-insensitively by name.
///
/// First occurrence wins and relative order is preserved.
pub(crate) fn dedupe_by_name(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen: IndexMap<String, Entity> = IndexMap::new();
    for entity in entities {
        seen.entry(entity.name.to_lowercase()).or_insert(entity);
    }
    seen.into_values().collect()
}

/// Parse a JSON payload that may be wrapped in markdown code fences.
///
/// Providers asked for "JSON only" still wrap output in ``` fences
/// often enough that stripping them is worth a second attempt.
pub(crate) fn parse_json_block<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .or_else(|_| {
            let stripped = raw
                .trim()
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim();
            serde_json::from_str(stripped)
        })
        .map_err(DiscoveryError::JsonParse)
}

/// Loose entity shape as AI providers return it.
#[derive(Deserialize)]
pub(crate) struct RawEntity {
    pub name: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub raw_mention: String,
    #[serde(default = "raw_confidence_default")]
    pub confidence: f32,
}

fn raw_confidence_default() -> f32 {
    1.0
}

/// Normalize a provider entity list into the internal schema.
///
/// Blank names are dropped and duplicates collapsed.
pub(crate) fn normalize_entities(raw: Vec<RawEntity>) -> Vec<Entity> {
    let entities = raw
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| {
            Entity::new(item.name, EntityKind::parse_loose(&item.entity_type))
                .with_mention(item.raw_mention)
                .with_confidence(item.confidence)
        })
        .collect();
    dedupe_by_name(entities)
}
