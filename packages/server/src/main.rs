//! ToolScout API server.
//!
//! Thin HTTP shell over the `discovery` crate: one engine, one worker
//! pool, one event bus, wired from environment configuration.

mod app;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use discovery::{PipelineBus, ScoutConfig, ScoutPool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{build_app, build_engine, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discovery=debug,server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ToolScout API");

    let config = ScoutConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        tavily = config.tavily.is_configured(),
        fastino = config.fastino.is_configured(),
        reka = config.reka.is_configured(),
        neo4j = config.neo4j.is_configured(),
        "Configuration loaded"
    );

    // One bus instance feeds both the engine emitters and the SSE route.
    let bus = PipelineBus::new();
    let engine = Arc::new(build_engine(&config, bus.clone()));

    let (pool, mut pool_errors) = ScoutPool::new(
        engine.clone(),
        config.pool_workers,
        config.pool_queue_capacity,
    );

    // Detached analyses have no caller waiting on them; log their failures.
    tokio::spawn(async move {
        while let Some(failure) = pool_errors.recv().await {
            tracing::warn!(
                source = %failure.source,
                error = %failure.message,
                "Detached analysis failed"
            );
        }
    });

    let state = AppState {
        engine,
        pool: Arc::new(pool),
        bus,
        config: Arc::new(config),
    };
    let app = build_app(state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .context("PORT must be a valid number")?;
    let addr = format!("0.0.0.0:{port}");

    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/health", port);
    tracing::info!("Event stream: http://localhost:{}/api/events", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
