//! Application state, engine wiring, and router assembly.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::{get, post};
use axum::Router;
use discovery::{
    ContentSearcher, ExtractorChain, FastinoExtractor, FileRegistry, Neo4jSink, PipelineBus,
    ProfileParser, RekaExtractor, ScoutConfig, ScoutEngine, ScoutPool, SearchResearcher,
    TavilySearcher,
};
use secrecy::{ExposeSecret, SecretString};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{
    analyze_handler, analyze_text_handler, events_handler, health_handler, research_tool_handler,
    status_handler,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoutEngine>,
    pub pool: Arc<ScoutPool>,
    pub bus: PipelineBus,
    pub config: Arc<ScoutConfig>,
}

/// Wire an engine from configuration.
///
/// Extraction providers without an API key are left out of the cascade;
/// the keyword scanner keeps extraction working with no keys at all. The
/// profile parser is constructed unconditionally because the researcher
/// already downgrades a failed parse to a stub profile.
pub fn build_engine(config: &ScoutConfig, bus: PipelineBus) -> ScoutEngine {
    let mut tavily = TavilySearcher::new(secret_or_empty(&config.tavily.api_key))
        .with_timeout(config.tavily.timeout);
    if let Some(base) = &config.tavily.base_url {
        tavily = tavily.with_base_url(base);
    }
    let searcher: Arc<dyn ContentSearcher> = Arc::new(tavily);

    let mut fastino = FastinoExtractor::new(secret_or_empty(&config.fastino.api_key))
        .with_timeout(config.fastino.timeout);
    if let Some(base) = &config.fastino.base_url {
        fastino = fastino.with_base_url(base);
    }
    let fastino = Arc::new(fastino);

    let mut chain = ExtractorChain::new();
    if config.fastino.is_configured() {
        chain = chain.with_provider(fastino.clone());
    }
    if config.reka.is_configured() {
        let mut reka = RekaExtractor::new(secret_or_empty(&config.reka.api_key))
            .with_timeout(config.reka.timeout);
        if let Some(base) = &config.reka.base_url {
            reka = reka.with_base_url(base);
        }
        chain = chain.with_provider(Arc::new(reka));
    }

    let parser: Arc<dyn ProfileParser> = fastino;
    let researcher = Arc::new(SearchResearcher::new(searcher.clone(), parser));

    let mut engine = ScoutEngine::new(searcher, chain, researcher)
        .with_research_concurrency(config.research_concurrency)
        .with_bus(bus);

    if let Some(path) = &config.catalog_path {
        let mut registry = FileRegistry::new(path);
        if let Some(dir) = &config.integrations_dir {
            registry = registry.with_integrations_dir(dir);
        }
        engine = engine.with_registry(Arc::new(registry));
    }

    if config.neo4j.is_configured() {
        // is_configured() guarantees uri and password are present
        let uri = config.neo4j.uri.clone().unwrap_or_default();
        let sink = Neo4jSink::new(uri, &config.neo4j.user, secret_or_empty(&config.neo4j.password))
            .with_database(&config.neo4j.database);
        engine = engine.with_sink(Arc::new(sink));
    }

    engine
}

fn secret_or_empty(key: &Option<SecretString>) -> String {
    key.as_ref()
        .map(|k| k.expose_secret().to_string())
        .unwrap_or_default()
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analyze-text", post(analyze_text_handler))
        .route("/api/research-tool", post(research_tool_handler))
        .route("/api/events", get(events_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
