use crate::error::SignalingError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use rendezvous_core::{ConnectionId, IceServerConfig, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Outbound halves of the live WebSockets, keyed by connection.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.inner.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_signal(
        &self,
        connection_id: ConnectionId,
        signal: ServerSignal,
    ) -> Result<(), SignalingError> {
        let json = signal.to_json()?;

        let Some(connection) = self.inner.connections.get(&connection_id) else {
            return Err(SignalingError::ConnectionClosed(connection_id));
        };
        connection
            .send(Message::Text(json.into()))
            .map_err(|_| SignalingError::ConnectionClosed(connection_id))
    }
}
