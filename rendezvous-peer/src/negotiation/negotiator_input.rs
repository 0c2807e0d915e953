use crate::media::{LocalTrack, MediaSource, RemoteTrack};
use crate::negotiation::state::NegotiationState;
use crate::transport::TransportEvent;
use rendezvous_core::{Identity, RoomId, ServerSignal};
use std::sync::Arc;

/// Everything the negotiator loop reacts to.
pub enum NegotiatorInput {
    Join(RoomId),
    Leave,
    Signal(ServerSignal),
    Transport {
        remote: Identity,
        /// Identifies which transport of the session raised the event.
        generation: u64,
        event: TransportEvent,
    },
    AddTrack(LocalTrack),
    /// Acquire local media once and publish what it yields.
    StartMedia(Arc<dyn MediaSource>),
    EndCall(Identity),
    Shutdown,
}

/// What the negotiator reports to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiatorEvent {
    Joined {
        room_id: RoomId,
    },
    StateChanged {
        remote: Identity,
        state: NegotiationState,
    },
    RemoteTrack {
        remote: Identity,
        track: RemoteTrack,
    },
    /// Both sides offered at once. `kept_offer` is true on the side whose
    /// offer survives.
    Glare {
        remote: Identity,
        kept_offer: bool,
    },
    SessionFailed {
        remote: Identity,
        reason: String,
    },
    SessionClosed {
        remote: Identity,
    },
    MediaUnavailable {
        reason: String,
    },
    ServerError {
        reason: String,
    },
}
