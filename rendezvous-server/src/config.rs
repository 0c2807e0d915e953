use clap::Parser;
use rendezvous_core::IceServerConfig;
use rendezvous_core::utils::default_ice_servers;
use std::net::SocketAddr;

use crate::registry::HubOptions;

/// Listen addresses and relay behaviour. Every flag can also come from
/// the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "rendezvous-server")]
#[command(about = "Room-scoped WebRTC signaling relay")]
pub struct ServerConfig {
    /// WebSocket relay endpoint.
    #[arg(long, env = "RENDEZVOUS_RELAY_ADDR", default_value = "0.0.0.0:8001")]
    pub relay_addr: SocketAddr,

    /// Health and stats endpoint.
    #[arg(long, env = "RENDEZVOUS_CONTROL_ADDR", default_value = "0.0.0.0:8000")]
    pub control_addr: SocketAddr,

    /// STUN/TURN URLs handed to clients on connect.
    #[arg(
        long = "ice-server",
        env = "RENDEZVOUS_ICE_SERVERS",
        value_delimiter = ','
    )]
    pub ice_servers: Vec<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    /// Send `delivery-failed` back when a relay target is unknown.
    #[arg(long, env = "RENDEZVOUS_NOTIFY_UNDELIVERABLE")]
    pub notify_undeliverable: bool,

    #[arg(long, env = "RENDEZVOUS_COMMAND_BUFFER", default_value_t = 256)]
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            relay_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            control_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            ice_servers: Vec::new(),
            turn_username: None,
            turn_credential: None,
            notify_undeliverable: false,
            command_buffer: 256,
        }
    }
}

impl ServerConfig {
    pub fn ice_server_configs(&self) -> Vec<IceServerConfig> {
        if self.ice_servers.is_empty() {
            return default_ice_servers();
        }

        vec![IceServerConfig {
            urls: self.ice_servers.clone(),
            username: self.turn_username.clone(),
            credential: self.turn_credential.clone(),
        }]
    }

    pub fn hub_options(&self) -> HubOptions {
        HubOptions {
            notify_undeliverable: self.notify_undeliverable,
            command_buffer: self.command_buffer,
        }
    }
}
