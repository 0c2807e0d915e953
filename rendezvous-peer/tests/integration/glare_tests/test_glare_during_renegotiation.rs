use rendezvous_core::SessionDescription;
use rendezvous_peer::NegotiationState;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, answers_to, audio_track, connect_pair, offers_to};

#[tokio::test]
async fn test_glare_during_renegotiation() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    let mut bob = TestPeer::new("bob");
    connect_pair(&mut alice, &mut bob).await;

    alice.negotiator.add_track(audio_track("alice-cam")).await;
    alice.negotiator.drain_inputs().await;
    bob.negotiator.add_track(audio_track("bob-cam")).await;
    bob.negotiator.drain_inputs().await;

    assert_eq!(alice.state("bob"), Some(NegotiationState::Renegotiating));
    assert_eq!(bob.state("alice"), Some(NegotiationState::Renegotiating));
    let alice_offer = offers_to(&alice.sent(), "bob").pop().unwrap();
    let bob_offer = offers_to(&bob.sent(), "alice").pop().unwrap();

    alice.offer_from("bob", bob_offer).await;
    bob.offer_from("alice", alice_offer).await;

    assert!(
        bob.factory
            .transport_for("alice")
            .unwrap()
            .local_descriptions()
            .contains(&SessionDescription::rollback())
    );
    // The yielding side answers, then offers its withdrawn changes again.
    let sent = bob.sent();
    assert_eq!(answers_to(&sent, "alice").len(), 1);
    assert_eq!(offers_to(&sent, "alice"), vec![SessionDescription::offer(
        "bob-offer-2"
    )]);
    assert_eq!(bob.state("alice"), Some(NegotiationState::Renegotiating));

    let answer = answers_to(&sent, "alice").pop().unwrap();
    alice.answer_from("bob", answer).await;
    assert_eq!(alice.state("bob"), Some(NegotiationState::Connected));

    let reoffer = offers_to(&sent, "alice").pop().unwrap();
    alice.offer_from("bob", reoffer).await;
    assert_eq!(alice.state("bob"), Some(NegotiationState::Connected));
    let answer = answers_to(&alice.sent(), "bob").pop().unwrap();
    bob.answer_from("alice", answer).await;
    assert_eq!(bob.state("alice"), Some(NegotiationState::Connected));
}
