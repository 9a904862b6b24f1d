//! Graph persistence sink trait.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::types::entity::DiscoveredTool;
use crate::types::report::DiscoveryRecord;

/// Write-behind sink for discovered tools.
///
/// All operations are idempotent upserts keyed by tool name
/// (`MERGE`-style semantics): running the same pipeline twice must not
/// accumulate duplicates. The orchestrator treats every call as
/// best-effort — failures are logged and swallowed, never propagated
/// into the report.
///
/// # Implementations
///
/// - `MemorySink` - in-memory map for tests and demos
/// - `Neo4jSink` - Neo4j over the HTTP transaction endpoint
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Upsert one discovered tool by name.
    async fn upsert_tool(&self, tool: &DiscoveredTool) -> SinkResult<()>;

    /// Record a discovery run and link it to the tools it found.
    async fn log_discovery(&self, record: &DiscoveryRecord) -> SinkResult<()>;
}
