use crate::error::NegotiatorError;
use crate::media::{LocalTrack, MediaSource};
use crate::negotiation::negotiator_input::NegotiatorInput;
use rendezvous_core::{Identity, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Cloneable sender side of a running [`SessionNegotiator`](crate::SessionNegotiator).
#[derive(Clone, Debug)]
pub struct NegotiatorHandle {
    input_tx: mpsc::UnboundedSender<NegotiatorInput>,
}

impl NegotiatorHandle {
    pub(crate) fn new(input_tx: mpsc::UnboundedSender<NegotiatorInput>) -> Self {
        Self { input_tx }
    }

    pub fn join(&self, room_id: RoomId) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::Join(room_id))
    }

    pub fn leave(&self) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::Leave)
    }

    /// Feed one frame received from the relay.
    pub fn signal(&self, signal: ServerSignal) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::Signal(signal))
    }

    pub fn add_track(&self, track: LocalTrack) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::AddTrack(track))
    }

    /// Failures surface as [`NegotiatorEvent::MediaUnavailable`](crate::NegotiatorEvent::MediaUnavailable).
    pub fn start_media(&self, source: Arc<dyn MediaSource>) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::StartMedia(source))
    }

    pub fn end_call(&self, remote: Identity) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::EndCall(remote))
    }

    pub fn shutdown(&self) -> Result<(), NegotiatorError> {
        self.send(NegotiatorInput::Shutdown)
    }

    fn send(&self, input: NegotiatorInput) -> Result<(), NegotiatorError> {
        self.input_tx
            .send(input)
            .map_err(|_| NegotiatorError::NegotiatorClosed)
    }
}
