use crate::app::AppState;
use crate::metrics::RelaySnapshot;
use crate::registry::RegistryStats;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub registry: RegistryStats,
    pub relay: RelaySnapshot,
    pub sockets: usize,
}

/// Administrative endpoint, served on its own listener.
pub fn control_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, StatusCode> {
    let registry = state
        .hub
        .stats()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(StatsResponse {
        registry,
        relay: state.metrics.snapshot(),
        sockets: state.signaling.connection_count(),
    }))
}
