//! HTTP and SSE route handlers.

use std::convert::Infallible;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use discovery::{research_url_for, DiscoveryError, PipelineReport};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::app::AppState;

/// How many recent events a new SSE subscriber gets replayed.
const REPLAY_EVENTS: usize = 20;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "toolscout",
    })
}

#[derive(Serialize)]
pub struct StatusResponse {
    configured_providers: Vec<&'static str>,
    missing_providers: Vec<&'static str>,
    provider_count: usize,
    version: &'static str,
}

pub async fn status_handler(Extension(state): Extension<AppState>) -> Json<StatusResponse> {
    let checks = [
        ("tavily", state.config.tavily.is_configured()),
        ("fastino", state.config.fastino.is_configured()),
        ("reka", state.config.reka.is_configured()),
        ("neo4j", state.config.neo4j.is_configured()),
    ];

    let mut configured = Vec::new();
    let mut missing = Vec::new();
    for (name, ok) in checks {
        if ok {
            configured.push(name);
        } else {
            missing.push(name);
        }
    }

    Json(StatusResponse {
        provider_count: configured.len(),
        configured_providers: configured,
        missing_providers: missing,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    url: String,
}

pub async fn analyze_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<PipelineReport>, (StatusCode, String)> {
    if request.url.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "url must not be empty".to_string(),
        ));
    }

    Ok(Json(state.engine.analyze(&request.url).await))
}

#[derive(Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    origin: String,
    text: String,
}

pub async fn analyze_text_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<PipelineReport>, (StatusCode, String)> {
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "text must not be empty".to_string(),
        ));
    }

    let origin = if request.origin.trim().is_empty() {
        "text:manual".to_string()
    } else {
        request.origin
    };

    Ok(Json(state.engine.analyze_text(&origin, &request.text).await))
}

#[derive(Deserialize)]
pub struct ResearchToolRequest {
    name: String,
}

#[derive(Serialize)]
pub struct QueuedResponse {
    status: &'static str,
    source: String,
}

/// Queue a deep dive on a single tool. The analysis runs on the worker
/// pool; progress arrives over `/api/events`.
pub async fn research_tool_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ResearchToolRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>), (StatusCode, String)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "name must not be empty".to_string(),
        ));
    }

    match state.pool.submit_enrichment(name) {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(QueuedResponse {
                status: "queued",
                source: research_url_for(name),
            }),
        )),
        Err(DiscoveryError::PoolSaturated) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            "analysis queue is full".to_string(),
        )),
        Err(e) => Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

/// Server-sent pipeline events: a `connected` handshake, a replay of
/// recent history, then live events for as long as the client listens.
pub async fn events_handler(
    Extension(state): Extension<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before snapshotting history so nothing published in
    // between is lost; a duplicate on the boundary is harmless.
    let subscription = state.bus.subscribe();
    let replay = state.bus.recent_history(REPLAY_EVENTS);

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let history = stream::iter(replay.into_iter().filter_map(|event| {
        Event::default()
            .event(event.kind.as_str())
            .json_data(&event)
            .ok()
            .map(Ok)
    }));

    let live = stream::unfold(subscription, |mut subscription| async move {
        subscription
            .recv()
            .await
            .map(|event| (event, subscription))
    })
    .filter_map(|event| async move {
        Event::default()
            .event(event.kind.as_str())
            .json_data(&event)
            .ok()
            .map(Ok)
    });

    Sse::new(connected.chain(history).chain(live)).keep_alive(KeepAlive::default())
}
