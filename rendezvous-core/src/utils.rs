pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";

use crate::model::IceServerConfig;

/// Public STUN servers used when no ICE configuration was supplied.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig {
        urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
        username: None,
        credential: None,
    }]
}
