use rendezvous_core::{ConnectionId, Identity, ProtocolError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalingError {
    /// Relay addressed to an identity with no live connection.
    #[error("no live connection for identity '{0}'")]
    UnresolvedTarget(Identity),

    /// Relay from a connection that never joined a room.
    #[error("connection {0} has not joined a room")]
    NotJoined(ConnectionId),

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("failed to encode signal: {0}")]
    Serialize(#[from] ProtocolError),

    #[error("signaling hub is not running")]
    HubClosed,
}
