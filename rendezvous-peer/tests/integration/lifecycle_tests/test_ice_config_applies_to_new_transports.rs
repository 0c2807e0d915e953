use rendezvous_core::{IceServerConfig, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_ice_config_applies_to_new_transports() {
    init_tracing();

    let servers = vec![IceServerConfig {
        urls: vec!["turn:turn.example.org:3478".to_owned()],
        username: Some("user".to_owned()),
        credential: Some("secret".to_owned()),
    }];

    let mut alice = TestPeer::new("alice");
    alice.peer_joined("bob").await;
    alice
        .receive(ServerSignal::IceConfig {
            ice_servers: servers.clone(),
        })
        .await;
    alice.peer_joined("carol").await;

    assert!(alice.factory.transport_for("bob").unwrap().ice_servers.is_empty());
    assert_eq!(alice.factory.transport_for("carol").unwrap().ice_servers, servers);
    assert_eq!(alice.negotiator.ice_servers(), servers.as_slice());
}
