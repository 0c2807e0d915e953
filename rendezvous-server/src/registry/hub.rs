use crate::error::SignalingError;
use crate::metrics::RelayMetrics;
use crate::registry::{HubCommand, RoomRegistry};
use crate::signaling::SignalingOutput;
use rendezvous_core::{ClientSignal, ConnectionId, Identity, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct HubOptions {
    /// Tell the sender when a relay target could not be resolved.
    pub notify_undeliverable: bool,
    pub command_buffer: usize,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            notify_undeliverable: false,
            command_buffer: 256,
        }
    }
}

/// Owns the [`RoomRegistry`] and applies commands one at a time, so no
/// handler ever sees a half-updated membership set.
pub struct SignalingHub {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<HubCommand>,
    output: Arc<dyn SignalingOutput>,
    metrics: Arc<RelayMetrics>,
    options: HubOptions,
}

impl SignalingHub {
    pub fn new(
        command_rx: mpsc::Receiver<HubCommand>,
        output: Arc<dyn SignalingOutput>,
        metrics: Arc<RelayMetrics>,
        options: HubOptions,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(),
            command_rx,
            output,
            metrics,
            options,
        }
    }

    pub async fn run(mut self) {
        info!("Hub event loop started");

        loop {
            match self.command_rx.recv().await {
                Some(cmd) => self.handle_command(cmd).await,
                None => {
                    info!("Command channel closed. Shutting down hub.");
                    break;
                }
            }
        }

        info!("Hub event loop finished");
    }

    async fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Signal {
                connection_id,
                signal,
            } => self.handle_signal(connection_id, signal).await,

            HubCommand::Disconnect { connection_id } => {
                debug!("Connection {} closed", connection_id);
                self.leave(connection_id).await;
            }

            HubCommand::Stats { reply } => {
                let _ = reply.send(self.registry.stats());
            }
        }
    }

    async fn handle_signal(&mut self, connection_id: ConnectionId, signal: ClientSignal) {
        let event = signal.event_name();

        match signal {
            ClientSignal::JoinRoom { identity, room_id } => {
                self.join(connection_id, identity, room_id).await;
            }

            ClientSignal::CallUser {
                target_identity,
                offer,
            } => {
                self.relay(connection_id, target_identity, event, |from| {
                    ServerSignal::IncomingCall { from, offer }
                })
                .await;
            }

            ClientSignal::CallAccepted {
                target_identity,
                answer,
            } => {
                self.relay(connection_id, target_identity, event, |from| {
                    ServerSignal::CallAccepted { from, answer }
                })
                .await;
            }

            ClientSignal::IceCandidate {
                target_identity,
                candidate,
            } => {
                self.relay(connection_id, target_identity, event, |from| {
                    ServerSignal::IceCandidate { from, candidate }
                })
                .await;
            }

            ClientSignal::LeaveRoom => self.leave(connection_id).await,
        }
    }

    async fn join(&mut self, connection_id: ConnectionId, identity: Identity, room_id: RoomId) {
        info!(
            "User '{}' joined room '{}' on {}",
            identity, room_id, connection_id
        );

        let outcome = self
            .registry
            .join(connection_id, identity.clone(), room_id.clone());
        self.metrics.record_join();

        if let Some(departure) = outcome.departed {
            if departure.released_identity {
                self.broadcast(&departure.remaining, ServerSignal::UserLeft {
                    identity: departure.identity,
                })
                .await;
            }
        }

        if let Some(displaced) = outcome.displaced {
            warn!(
                "Identity '{}' rebound from {} to {}",
                identity, displaced, connection_id
            );
        }

        self.deliver(connection_id, ServerSignal::JoinedRoom { room_id })
            .await;
        self.broadcast(&outcome.peers, ServerSignal::UserJoined { identity })
            .await;
    }

    async fn leave(&mut self, connection_id: ConnectionId) {
        let Some(departure) = self.registry.leave(&connection_id) else {
            return;
        };
        self.metrics.record_leave();
        info!(
            "User '{}' left room '{}'",
            departure.identity, departure.room_id
        );

        if departure.released_identity {
            self.broadcast(&departure.remaining, ServerSignal::UserLeft {
                identity: departure.identity,
            })
            .await;
        }
    }

    async fn relay<F>(
        &mut self,
        from_connection: ConnectionId,
        target: Identity,
        event: &'static str,
        build: F,
    ) where
        F: FnOnce(Identity) -> ServerSignal,
    {
        match self.route(&from_connection, &target) {
            Ok((from, to_connection)) => {
                debug!("Relaying {} from '{}' to '{}'", event, from, target);
                self.deliver(to_connection, build(from)).await;
                self.metrics.record_relayed();
            }
            Err(SignalingError::UnresolvedTarget(target)) => {
                self.metrics.record_unresolved();
                warn!("Dropping {}: no live connection for '{}'", event, target);

                if self.options.notify_undeliverable {
                    let notice = ServerSignal::DeliveryFailed {
                        target_identity: target,
                        event: event.to_owned(),
                    };
                    self.deliver(from_connection, notice).await;
                }
            }
            Err(e) => {
                self.metrics.record_not_joined();
                warn!("Dropping {}: {}", event, e);
                self.deliver(from_connection, ServerSignal::Error {
                    reason: e.to_string(),
                })
                .await;
            }
        }
    }

    fn route(
        &self,
        from_connection: &ConnectionId,
        target: &Identity,
    ) -> Result<(Identity, ConnectionId), SignalingError> {
        let from = self
            .registry
            .identity_of(from_connection)
            .cloned()
            .ok_or(SignalingError::NotJoined(*from_connection))?;

        let to_connection = self
            .registry
            .resolve(target)
            .ok_or_else(|| SignalingError::UnresolvedTarget(target.clone()))?;

        Ok((from, to_connection))
    }

    async fn broadcast(&self, connections: &[ConnectionId], signal: ServerSignal) {
        for connection_id in connections {
            self.deliver(*connection_id, signal.clone()).await;
        }
    }

    async fn deliver(&self, connection_id: ConnectionId, signal: ServerSignal) {
        if let Err(e) = self.output.send_signal(connection_id, signal).await {
            error!("Failed to deliver signal to {}: {}", connection_id, e);
        }
    }
}
