use crate::media::RemoteTrack;
use rendezvous_core::IceCandidate;

/// Callbacks a transport raises toward its negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A local candidate was gathered and should be trickled to the remote side.
    IceCandidate(IceCandidate),
    Track(RemoteTrack),
    /// The local track set changed and the remote side needs a new offer.
    NegotiationNeeded,
    Failed(String),
}
