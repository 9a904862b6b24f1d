//! URL-Driven Tool Discovery Library
//!
//! Point the engine at a URL (a hackathon sponsor page, a launch post, a
//! docs site) and it scrapes the page, extracts tool and vendor mentions,
//! researches each one into a structured profile, compares the results
//! against the tools already integrated, and recommends what to do about
//! each: integrate, evaluate, or skip.
//!
//! # Design
//!
//! - One pipeline, swappable providers: every external capability
//!   (search, extraction, research parsing, registry, graph storage)
//!   sits behind a trait.
//! - Graceful degradation over failure: AI extractors cascade down to a
//!   keyword scanner, research falls back to stub profiles, persistence
//!   and registry lookups are best-effort. Only a page that cannot be
//!   fetched at all fails a run.
//! - One recommendation per discovered tool, always.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use discovery::{
//!     ExtractorChain, FastinoExtractor, PipelineBus, ScoutEngine,
//!     SearchResearcher, TavilySearcher,
//! };
//!
//! let searcher = Arc::new(TavilySearcher::new("tvly-..."));
//! let parser = Arc::new(FastinoExtractor::new("fk-..."));
//!
//! let engine = ScoutEngine::new(
//!     searcher.clone(),
//!     ExtractorChain::new().with_provider(parser.clone()),
//!     Arc::new(SearchResearcher::new(searcher, parser)),
//! )
//! .with_bus(PipelineBus::new());
//!
//! let report = engine.analyze("https://lu.ma/ai-tinkerers").await;
//! println!("{} tools found", report.discovered_tools.len());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (searcher, extractor, researcher, registry, sink)
//! - [`types`] - Entities, tool profiles, reports, recommendations
//! - [`engine`] - The pipeline orchestrator
//! - [`extract`] - Extraction providers and the fallback chain
//! - [`research`] - Search-backed entity research
//! - [`compare`] - Capability overlap scoring and recommendations
//! - [`registry`] - File-backed existing-tool lookup
//! - [`searchers`] - Content search providers (Tavily)
//! - [`sinks`] - Graph persistence (Neo4j, in-memory)
//! - [`bus`] - Bounded pub/sub progress events
//! - [`pool`] - Bounded worker pool for detached analyses
//! - [`config`] - Environment-driven configuration
//! - [`testing`] - Mock implementations for testing

pub mod bus;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod pool;
pub mod registry;
pub mod research;
pub mod searchers;
pub mod sinks;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DiscoveryError, Result, SinkError, SinkResult};
pub use traits::{
    extractor::EntityExtractor,
    registry::ToolRegistry,
    researcher::{ProfileParser, Researcher},
    searcher::{ContentSearcher, MockSearcher, SearchDepth, SearchHit, SearchResponse},
    sink::GraphSink,
};
pub use types::{
    entity::{AuthType, DiscoveredTool, Entity, EntityKind, EntityResearch},
    report::{
        Action, DiscoveryRecord, ExistingTool, PipelineReport, RecommendedAction, SourceKind,
        ToolComparison,
    },
};

// Re-export the engine and its pipeline companions
pub use bus::{EventKind, PipelineBus, PipelineEvent, Subscription};
pub use compare::{compare, recommend};
pub use engine::{research_url_for, ScoutEngine, ENGINE};
pub use pool::{Job, PoolError, ScoutPool};

// Re-export provider implementations
pub use extract::{ExtractorChain, FastinoExtractor, KeywordExtractor, RekaExtractor};
pub use registry::FileRegistry;
pub use research::SearchResearcher;
pub use searchers::TavilySearcher;
pub use sinks::{MemorySink, Neo4jSink};

// Re-export configuration
pub use config::{Neo4jSettings, ProviderSettings, ScoutConfig};

// Re-export testing utilities
pub use testing::{FailingSink, MockExtractor, MockParser, MockRegistry, MockResearcher};
