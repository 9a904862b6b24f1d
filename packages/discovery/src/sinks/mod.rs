//! Graph persistence sinks.
//!
//! Everything here is best-effort from the pipeline's point of view:
//! the orchestrator logs sink failures and keeps going. Writes are
//! idempotent (MERGE semantics keyed by tool name) so re-running a URL
//! never duplicates nodes.

pub mod memory;
pub mod neo4j;

pub use memory::MemorySink;
pub use neo4j::Neo4jSink;
