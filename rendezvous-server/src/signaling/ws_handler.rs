use crate::app::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use rendezvous_core::{ClientSignal, ConnectionId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::signaling::SignalingOutput;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_connection(connection_id, tx);

    let ice_config = ServerSignal::IceConfig {
        ice_servers: state.signaling.get_ice_servers(),
    };
    if let Err(e) = state.signaling.send_signal(connection_id, ice_config).await {
        error!("Failed to send ICE config to {}: {}", connection_id, e);
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientSignal::parse(&text) {
                        Ok(signal) => {
                            debug!("{} from {}", signal.event_name(), connection_id);
                            if let Err(e) = state.hub.dispatch(connection_id, signal).await {
                                error!("Hub died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            state.metrics.record_malformed();
                            warn!("Invalid signal from {}: {}", connection_id, e);
                            let reply = ServerSignal::Error {
                                reason: e.to_string(),
                            };
                            let _ = state.signaling.send_signal(connection_id, reply).await;
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = state.hub.disconnect(connection_id).await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // The receive task may have been aborted before it reported the close.
    let _ = state.hub.disconnect(connection_id).await;
    state.signaling.remove_connection(&connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}
