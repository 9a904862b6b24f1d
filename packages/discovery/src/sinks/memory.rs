//! In-memory graph sink.
//!
//! Stands in for Neo4j in tests and in deployments that don't run a
//! graph database. Upserts are keyed by tool name with last-write-wins
//! properties, mirroring the MERGE/SET contract of the real sink.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::traits::sink::GraphSink;
use crate::types::entity::DiscoveredTool;
use crate::types::report::DiscoveryRecord;

/// Graph sink backed by process memory.
#[derive(Default)]
pub struct MemorySink {
    tools: RwLock<HashMap<String, DiscoveredTool>>,
    discoveries: RwLock<Vec<DiscoveryRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored tool by name.
    pub fn tool(&self, name: &str) -> Option<DiscoveredTool> {
        self.tools.read().unwrap().get(name).cloned()
    }

    /// Number of distinct tools stored.
    pub fn tool_count(&self) -> usize {
        self.tools.read().unwrap().len()
    }

    /// All discovery records, in write order.
    pub fn discoveries(&self) -> Vec<DiscoveryRecord> {
        self.discoveries.read().unwrap().clone()
    }
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn upsert_tool(&self, tool: &DiscoveredTool) -> SinkResult<()> {
        self.tools
            .write()
            .unwrap()
            .insert(tool.name.clone(), tool.clone());
        Ok(())
    }

    async fn log_discovery(&self, record: &DiscoveryRecord) -> SinkResult<()> {
        self.discoveries.write().unwrap().push(record.clone());
        Ok(())
    }
}
