use crate::registry::RegistryStats;
use rendezvous_core::{ClientSignal, ConnectionId};
use tokio::sync::oneshot;

/// Commands fed to the hub by the socket handlers.
#[derive(Debug)]
pub enum HubCommand {
    /// A validated frame received on a connection.
    Signal {
        connection_id: ConnectionId,
        signal: ClientSignal,
    },

    /// The socket closed; release everything held for it.
    Disconnect { connection_id: ConnectionId },

    Stats { reply: oneshot::Sender<RegistryStats> },
}
