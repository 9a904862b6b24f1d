//! Research traits: entity enrichment and profile parsing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::entity::{DiscoveredTool, Entity, EntityResearch};

/// Enriches one entity into a structured tool profile.
///
/// `research` is deliberately infallible: on any internal failure it
/// returns a profile carrying only the entity's name, so downstream
/// stages never null-check whether research succeeded. Failures are
/// isolated per entity — one bad lookup never aborts the others.
#[async_trait]
pub trait Researcher: Send + Sync {
    /// Research one entity, degrading to a name-only stub on failure.
    async fn research(&self, entity: &Entity) -> EntityResearch;
}

/// Maps free research text into the fixed tool-profile schema.
///
/// The secondary step of research: the searcher gathers evidence, the
/// parser structures it. Kept separate so the two provider choices can
/// vary independently.
#[async_trait]
pub trait ProfileParser: Send + Sync {
    /// Parse research text into a profile for the entity.
    ///
    /// Errors (provider down, malformed JSON) are turned into stubs by
    /// the caller, never surfaced past the research stage.
    async fn parse_profile(&self, entity: &Entity, research_text: &str) -> Result<DiscoveredTool>;
}
