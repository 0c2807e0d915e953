use rendezvous_core::{Identity, ServerSignal};
use rendezvous_peer::{NegotiatorEvent, TransportEvent};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, connect_pair};

#[tokio::test]
async fn test_user_left_tears_down_session() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    let mut bob = TestPeer::new("bob");
    connect_pair(&mut alice, &mut bob).await;
    alice.emitted();

    alice
        .receive(ServerSignal::UserLeft {
            identity: Identity::from("bob"),
        })
        .await;

    assert_eq!(alice.state("bob"), None);
    let transport = alice.factory.transport_for("bob").unwrap();
    assert!(transport.is_closed());
    assert!(!transport.emit(TransportEvent::NegotiationNeeded));
    assert_eq!(alice.emitted(), vec![NegotiatorEvent::SessionClosed {
        remote: "bob".into()
    }]);
}

#[tokio::test]
async fn test_end_call_releases_transport() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    alice.peer_joined("bob").await;
    alice.peer_joined("carol").await;

    alice.negotiator.end_call(&"bob".into()).await;

    assert_eq!(alice.negotiator.session_count(), 1);
    assert!(alice.factory.transport_for("bob").unwrap().is_closed());
    assert!(!alice.factory.transport_for("carol").unwrap().is_closed());
}

#[tokio::test]
async fn test_leave_closes_every_session() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    alice.peer_joined("bob").await;
    alice.peer_joined("carol").await;
    alice.sent();

    alice.negotiator.leave().await.unwrap();

    assert_eq!(alice.negotiator.session_count(), 0);
    assert!(alice.factory.transport_for("bob").unwrap().is_closed());
    assert!(alice.factory.transport_for("carol").unwrap().is_closed());
    assert_eq!(alice.sent(), vec![rendezvous_core::ClientSignal::LeaveRoom]);
}
