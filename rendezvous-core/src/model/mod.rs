mod connection;
mod identity;
mod room;
mod session;
mod signaling;

pub use connection::ConnectionId;
pub use identity::Identity;
pub use room::RoomId;
pub use session::{IceCandidate, SdpKind, SessionDescription};
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
