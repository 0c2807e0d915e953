use rendezvous_core::SessionDescription;
use rendezvous_peer::{NegotiationState, NegotiatorEvent};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, answers_to, connect_pair};

#[tokio::test]
async fn test_remote_renegotiation_stays_connected() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    let mut bob = TestPeer::new("bob");
    connect_pair(&mut alice, &mut bob).await;
    assert_eq!(bob.state("alice"), Some(NegotiationState::Connected));
    bob.emitted();

    bob.offer_from("alice", SessionDescription::offer("alice-offer-2"))
        .await;

    assert_eq!(
        answers_to(&bob.sent(), "alice"),
        vec![SessionDescription::answer("bob-answer-2")]
    );
    assert_eq!(bob.state("alice"), Some(NegotiationState::Connected));
    assert!(
        !bob.emitted()
            .iter()
            .any(|event| matches!(event, NegotiatorEvent::StateChanged { .. })),
        "an answered renegotiation never leaves Connected"
    );
}
