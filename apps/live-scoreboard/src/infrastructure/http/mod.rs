//! HTTP API and SSE endpoints.
//!
//! Admin commands, viewer queries and the two event streams share one
//! router. Every handler is a thin adapter over `ScoreboardService`.
//!
//! # Endpoints
//!
//! - `POST /api/admin/match` - Create a match
//! - `POST /api/admin/match/{id}/start` - Kick off
//! - `POST /api/admin/match/{id}/end` - Final whistle
//! - `POST /api/admin/match/{id}/event` - Record an in-play event
//! - `GET /api/matches` - All matches
//! - `GET /api/matches/{id}` - One match
//! - `GET /api/matches/{id}/clock` - Live display clock
//! - `GET /events/matches` - SSE stream of the live-match list
//! - `GET /events/matches/{id}` - SSE stream of one match

mod error;
mod sse;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{KeepAlive, KeepAliveStream, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ErrorBody};
pub use sse::{SnapshotStream, SubscriptionGuard};

use crate::application::services::SharedScoreboard;
use crate::domain::matches::{EventRequest, Match};
use crate::infrastructure::broadcast::{SnapshotReceiver, channel_sink};
use crate::infrastructure::config::ScoreboardConfig;

// =============================================================================
// Router
// =============================================================================

/// Shared state for the API handlers.
#[derive(Clone)]
pub struct ApiState {
    scoreboard: SharedScoreboard,
    sink_capacity: usize,
    keep_alive_interval: Duration,
    shutdown: CancellationToken,
}

impl ApiState {
    fn open_stream(
        &self,
        rx: SnapshotReceiver,
        guard: SubscriptionGuard,
    ) -> Sse<KeepAliveStream<SnapshotStream>> {
        Sse::new(SnapshotStream::new(rx, guard, self.shutdown.clone()))
            .keep_alive(KeepAlive::new().interval(self.keep_alive_interval))
    }
}

/// Create the Axum router with all endpoints.
///
/// Cancelling `shutdown` ends every open event stream.
#[must_use]
pub fn create_router(
    scoreboard: SharedScoreboard,
    config: &ScoreboardConfig,
    shutdown: CancellationToken,
) -> Router {
    let state = ApiState {
        scoreboard,
        sink_capacity: config.stream.sink_capacity,
        keep_alive_interval: config.stream.keep_alive_interval,
        shutdown,
    };

    let router = Router::new()
        .route("/api/admin/match", post(create_match))
        .route("/api/admin/match/{id}/start", post(start_match))
        .route("/api/admin/match/{id}/end", post(end_match))
        .route("/api/admin/match/{id}/event", post(record_event))
        .route("/api/matches", get(list_matches))
        .route("/api/matches/{id}", get(get_match))
        .route("/api/matches/{id}/clock", get(match_clock))
        .route("/events/matches", get(stream_live_matches))
        .route("/events/matches/{id}", get(stream_match))
        .with_state(state);

    if config.server.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// =============================================================================
// API Server
// =============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

/// Bind the API port.
///
/// # Errors
///
/// Returns `ApiServerError::BindFailed` if the port is unavailable.
pub async fn bind(port: u16) -> Result<TcpListener, ApiServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| ApiServerError::BindFailed(port, e.to_string()))
}

/// Serve the router on an already bound listener until cancelled.
///
/// Streams opened through a router built with the same token end on
/// cancellation, so open SSE connections do not hold up shutdown.
///
/// # Errors
///
/// Returns `ApiServerError::ServerFailed` on a fatal server error.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), ApiServerError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// =============================================================================
// Request and Response Types
// =============================================================================

/// Request to create a match.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateMatchRequest {
    /// Display name of side A.
    pub team_a: String,
    /// Display name of side B.
    pub team_b: String,
}

/// Response to a start or end command.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// Confirmation message.
    pub message: &'static str,
    /// Match after the transition.
    #[serde(rename = "match")]
    pub game: Match,
}

/// Live display clock.
#[derive(Debug, Serialize)]
pub struct ClockResponse {
    /// Clock label (`"37'"`, `"90+4'"`, `"FT"`).
    pub clock: String,
}

// =============================================================================
// Admin Handlers
// =============================================================================

async fn create_match(
    State(state): State<ApiState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let created = state.scoreboard.create_match(&req.team_a, &req.team_b)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn start_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let game = state.scoreboard.start_match(&id)?;
    Ok(Json(TransitionResponse {
        message: "Match started",
        game,
    }))
}

async fn end_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let game = state.scoreboard.end_match(&id)?;
    Ok(Json(TransitionResponse {
        message: "Match ended",
        game,
    }))
}

async fn record_event(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<EventRequest>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.scoreboard.record_event(&id, req)?))
}

// =============================================================================
// Viewer Handlers
// =============================================================================

async fn list_matches(State(state): State<ApiState>) -> Json<Vec<Match>> {
    Json(state.scoreboard.list_matches())
}

async fn get_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.scoreboard.get_match(&id)?))
}

async fn match_clock(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ClockResponse>, ApiError> {
    let clock = state.scoreboard.match_clock(&id)?;
    Ok(Json(ClockResponse { clock }))
}

// =============================================================================
// Stream Handlers
// =============================================================================

async fn stream_live_matches(
    State(state): State<ApiState>,
) -> Sse<KeepAliveStream<SnapshotStream>> {
    let (sink, rx) = channel_sink(state.sink_capacity);
    let id = state.scoreboard.subscribe_global(sink);
    let guard = SubscriptionGuard::global(Arc::clone(&state.scoreboard), id);

    state.open_stream(rx, guard)
}

async fn stream_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Sse<KeepAliveStream<SnapshotStream>>, ApiError> {
    let (sink, rx) = channel_sink(state.sink_capacity);
    let subscriber = state.scoreboard.subscribe_match(&id, sink)?;
    let guard = SubscriptionGuard::for_match(Arc::clone(&state.scoreboard), id, subscriber);

    Ok(state.open_stream(rx, guard))
}

// =============================================================================
// Tests
// =============================================================================
