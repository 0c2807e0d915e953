pub use rendezvous_core::model::{ConnectionId, Identity, RoomId};

pub mod model {
    pub use rendezvous_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use rendezvous_server::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use rendezvous_peer::*;
}
