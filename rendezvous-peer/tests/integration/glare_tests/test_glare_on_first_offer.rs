use rendezvous_core::SessionDescription;
use rendezvous_peer::{NegotiationState, NegotiatorEvent};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, answers_to, offers_to};

#[tokio::test]
async fn test_glare_on_first_offer() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    let mut bob = TestPeer::new("bob");

    // Both learn about each other and offer at the same time.
    alice.peer_joined("bob").await;
    bob.peer_joined("alice").await;
    let alice_offer = offers_to(&alice.sent(), "bob").pop().unwrap();
    let bob_offer = offers_to(&bob.sent(), "alice").pop().unwrap();

    alice.offer_from("bob", bob_offer).await;
    bob.offer_from("alice", alice_offer.clone()).await;

    // "alice" < "bob": alice keeps her offer and ignores bob's.
    assert!(alice.sent().is_empty());
    assert_eq!(alice.state("bob"), Some(NegotiationState::OfferSent));
    assert!(alice.emitted().contains(&NegotiatorEvent::Glare {
        remote: "bob".into(),
        kept_offer: true,
    }));

    // bob withdraws his offer and answers alice's on the same transport.
    let bob_transport = bob.factory.transport_for("alice").unwrap();
    assert_eq!(bob.factory.created_count(), 1);
    assert!(
        bob_transport
            .local_descriptions()
            .contains(&SessionDescription::rollback())
    );
    assert_eq!(bob_transport.remote_descriptions(), vec![alice_offer]);
    let answer = answers_to(&bob.sent(), "alice").pop().expect("bob answered");
    assert_eq!(bob.state("alice"), Some(NegotiationState::AnswerSent));
    assert!(bob.emitted().contains(&NegotiatorEvent::Glare {
        remote: "alice".into(),
        kept_offer: false,
    }));

    alice.answer_from("bob", answer).await;
    assert_eq!(alice.state("bob"), Some(NegotiationState::Connected));
}
