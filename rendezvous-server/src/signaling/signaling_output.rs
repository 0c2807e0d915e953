use crate::error::SignalingError;
use async_trait::async_trait;
use rendezvous_core::{ConnectionId, ServerSignal};

/// Delivery side of the relay: the hub decides *who* gets a signal, an
/// implementation of this trait gets it onto that connection's wire.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(
        &self,
        connection_id: ConnectionId,
        signal: ServerSignal,
    ) -> Result<(), SignalingError>;
}
