use crate::error::SignalingError;
use crate::metrics::RelayMetrics;
use crate::registry::{HubCommand, HubOptions, RegistryStats, SignalingHub};
use crate::signaling::SignalingOutput;
use rendezvous_core::{ClientSignal, ConnectionId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Cloneable sender side of the hub.
#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Start a hub task on the current runtime.
    pub fn spawn(
        output: Arc<dyn SignalingOutput>,
        metrics: Arc<RelayMetrics>,
        options: HubOptions,
    ) -> Self {
        info!("Starting signaling hub");
        let (command_tx, command_rx) = mpsc::channel(options.command_buffer.max(1));

        let hub = SignalingHub::new(command_rx, output, metrics, options);
        tokio::spawn(hub.run());

        Self { command_tx }
    }

    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        signal: ClientSignal,
    ) -> Result<(), SignalingError> {
        self.send(HubCommand::Signal {
            connection_id,
            signal,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), SignalingError> {
        self.send(HubCommand::Disconnect { connection_id }).await
    }

    /// Registry sizes. Every command queued before this call has been
    /// processed once it returns.
    pub async fn stats(&self) -> Result<RegistryStats, SignalingError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| SignalingError::HubClosed)
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), SignalingError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SignalingError::HubClosed)
    }
}
