use crate::error::NegotiatorError;
use async_trait::async_trait;
use rendezvous_core::ClientSignal;
use tokio::sync::mpsc;

/// Outbound half of the relay connection, as seen by the negotiator.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), NegotiatorError>;
}

#[async_trait]
impl SignalSink for mpsc::UnboundedSender<ClientSignal> {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), NegotiatorError> {
        self.send(signal)
            .map_err(|_| NegotiatorError::SignalChannelClosed)
    }
}
