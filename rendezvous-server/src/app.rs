use crate::config::ServerConfig;
use crate::control::control_router;
use crate::metrics::RelayMetrics;
use crate::registry::HubHandle;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub struct AppState {
    pub signaling: SignalingService,
    pub hub: HubHandle,
    pub metrics: Arc<RelayMetrics>,
}

impl AppState {
    /// Wire the socket registry to a freshly spawned hub.
    pub fn new(config: &ServerConfig) -> Arc<Self> {
        let signaling = SignalingService::new(config.ice_server_configs());
        let metrics = Arc::new(RelayMetrics::default());

        let hub = HubHandle::spawn(
            Arc::new(signaling.clone()),
            metrics.clone(),
            config.hub_options(),
        );

        Arc::new(Self {
            signaling,
            hub,
            metrics,
        })
    }
}

pub fn relay_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind both listeners and serve until one of them fails.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config);

    let relay_listener = tokio::net::TcpListener::bind(config.relay_addr)
        .await
        .with_context(|| format!("Failed to bind relay endpoint {}", config.relay_addr))?;
    let control_listener = tokio::net::TcpListener::bind(config.control_addr)
        .await
        .with_context(|| format!("Failed to bind control endpoint {}", config.control_addr))?;

    info!("Signaling relay listening on ws://{}/ws", config.relay_addr);
    info!("Control endpoint listening on http://{}", config.control_addr);

    let relay = relay_router(state.clone());
    let control = control_router(state);

    tokio::try_join!(
        async {
            axum::serve(relay_listener, relay)
                .await
                .context("Relay endpoint failed")
        },
        async {
            axum::serve(control_listener, control)
                .await
                .context("Control endpoint failed")
        },
    )?;

    Ok(())
}
