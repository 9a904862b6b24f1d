//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the discovery
//! library without making real provider or network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{DiscoveryError, Result, SinkError, SinkResult};
use crate::traits::{
    extractor::EntityExtractor,
    registry::ToolRegistry,
    researcher::{ProfileParser, Researcher},
    sink::GraphSink,
};
use crate::types::{
    entity::{DiscoveredTool, Entity, EntityKind, EntityResearch},
    report::{DiscoveryRecord, ExistingTool},
};

/// A mock entity extractor for testing.
///
/// Returns a canned entity list, or a provider error when constructed
/// with [`MockExtractor::failing`]. Records every input it sees.
pub struct MockExtractor {
    name: &'static str,
    entities: Arc<RwLock<Vec<Entity>>>,
    inputs: Arc<RwLock<Vec<String>>>,
    fail: bool,
}

impl MockExtractor {
    /// Create a mock that returns no entities.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entities: Arc::new(RwLock::new(Vec::new())),
            inputs: Arc::new(RwLock::new(Vec::new())),
            fail: false,
        }
    }

    /// Create a mock whose extract call always errors.
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    /// Set the canned entity list.
    pub fn with_entities(self, entities: Vec<Entity>) -> Self {
        *self.entities.write().unwrap() = entities;
        self
    }

    /// Inputs passed to extract, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.read().unwrap().clone()
    }

    /// Number of extract calls made.
    pub fn call_count(&self) -> usize {
        self.inputs.read().unwrap().len()
    }
}

#[async_trait]
impl EntityExtractor for MockExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        self.inputs.write().unwrap().push(text.to_string());

        if self.fail {
            return Err(DiscoveryError::Provider(
                format!("mock extractor '{}' failure", self.name).into(),
            ));
        }

        Ok(self.entities.read().unwrap().clone())
    }
}

/// A mock profile parser for testing.
///
/// Returns canned profiles by entity name, generating a minimal
/// default for unknown names.
#[derive(Default)]
pub struct MockParser {
    /// Predefined profiles keyed by lowercase entity name
    profiles: Arc<RwLock<HashMap<String, DiscoveredTool>>>,

    /// When set, every parse call errors
    fail: bool,
}

impl MockParser {
    /// Create a mock parser with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose parse call always errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Add a canned profile for an entity name.
    pub fn with_profile(self, entity_name: impl Into<String>, tool: DiscoveredTool) -> Self {
        self.profiles
            .write()
            .unwrap()
            .insert(entity_name.into().to_lowercase(), tool);
        self
    }
}

#[async_trait]
impl ProfileParser for MockParser {
    async fn parse_profile(&self, entity: &Entity, _research_text: &str) -> Result<DiscoveredTool> {
        if self.fail {
            return Err(DiscoveryError::Provider("mock parser failure".into()));
        }

        Ok(self
            .profiles
            .read()
            .unwrap()
            .get(&entity.name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| {
                DiscoveredTool::stub(&entity.name)
                    .with_description(format!("Mock profile for {}", entity.name))
            }))
    }
}

/// A mock researcher for testing.
///
/// Skips search entirely: returns a canned tool when one is registered
/// for the entity name, otherwise a stub.
#[derive(Default)]
pub struct MockResearcher {
    /// Predefined tools keyed by lowercase entity name
    tools: Arc<RwLock<HashMap<String, DiscoveredTool>>>,

    /// Entity names researched, in call order
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockResearcher {
    /// Create a mock researcher that returns stubs for everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned tool for an entity name.
    pub fn with_tool(self, entity_name: impl Into<String>, tool: DiscoveredTool) -> Self {
        self.tools
            .write()
            .unwrap()
            .insert(entity_name.into().to_lowercase(), tool);
        self
    }

    /// Entity names researched so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Researcher for MockResearcher {
    async fn research(&self, entity: &Entity) -> EntityResearch {
        self.calls.write().unwrap().push(entity.name.clone());

        let tool = self
            .tools
            .read()
            .unwrap()
            .get(&entity.name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| DiscoveredTool::stub(&entity.name));

        EntityResearch {
            entity: entity.clone(),
            tool,
            raw_research: format!("Mock research for {}", entity.name),
            sources: Vec::new(),
        }
    }
}

/// A mock tool registry for testing.
///
/// Matches stored tools by case-insensitive name containment, the same
/// contract as the file-backed registry.
#[derive(Default)]
pub struct MockRegistry {
    tools: Arc<RwLock<Vec<ExistingTool>>>,

    /// Names looked up, in call order
    calls: Arc<RwLock<Vec<String>>>,

    /// When set, every lookup errors
    fail: bool,
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose lookups always error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Add an existing tool.
    pub fn with_tool(self, tool: ExistingTool) -> Self {
        self.tools.write().unwrap().push(tool);
        self
    }

    /// Names looked up so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ToolRegistry for MockRegistry {
    async fn lookup(&self, name: &str) -> Result<Option<ExistingTool>> {
        self.calls.write().unwrap().push(name.to_string());

        if self.fail {
            return Err(DiscoveryError::Registry("mock registry failure".into()));
        }

        let needle = name.to_lowercase();
        Ok(self
            .tools
            .read()
            .unwrap()
            .iter()
            .find(|t| t.name.to_lowercase().contains(&needle))
            .cloned())
    }
}

/// A graph sink that rejects every write.
///
/// Useful for asserting that persistence failures stay non-fatal.
#[derive(Default)]
pub struct FailingSink;

impl FailingSink {
    /// Create a failing sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GraphSink for FailingSink {
    async fn upsert_tool(&self, _tool: &DiscoveredTool) -> SinkResult<()> {
        Err(SinkError::Transport(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Mock connection refused",
        ))))
    }

    async fn log_discovery(&self, _record: &DiscoveryRecord) -> SinkResult<()> {
        Err(SinkError::Transport(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Mock connection refused",
        ))))
    }
}

/// Build an entity fixture with Tool kind and 0.9 confidence.
pub fn sample_entity(name: &str) -> Entity {
    Entity::new(name, EntityKind::Tool).with_confidence(0.9)
}

/// Build a fully-populated tool fixture.
pub fn sample_tool(name: &str) -> DiscoveredTool {
    DiscoveredTool::stub(name)
        .with_vendor(format!("{name} Inc"))
        .with_description(format!("{name} developer platform"))
        .with_capabilities(vec!["search".to_string(), "extract".to_string()])
        .with_auth_type(crate::types::entity::AuthType::ApiKey)
        .with_free_tier(true)
}
