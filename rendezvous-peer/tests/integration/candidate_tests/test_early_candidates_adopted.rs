use rendezvous_core::{IceCandidate, SessionDescription};
use rendezvous_peer::NegotiatorConfig;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, TransportCall};

#[tokio::test]
async fn test_early_candidates_adopted() {
    init_tracing();

    let mut bob = TestPeer::new("bob");

    // Candidates can overtake the offer they belong to.
    bob.candidate_from("alice", "c1").await;
    bob.candidate_from("alice", "c2").await;
    assert_eq!(bob.negotiator.session_count(), 0);
    assert_eq!(bob.negotiator.early_candidate_count(&"alice".into()), 2);

    let offer = SessionDescription::offer("alice-offer-1");
    bob.offer_from("alice", offer.clone()).await;

    let calls = bob.factory.transport_for("alice").unwrap().calls();
    assert_eq!(&calls[..3], &[
        TransportCall::SetRemote(offer),
        TransportCall::AddCandidate(IceCandidate::new("c1")),
        TransportCall::AddCandidate(IceCandidate::new("c2")),
    ]);
    assert_eq!(bob.negotiator.early_candidate_count(&"alice".into()), 0);
}

#[tokio::test]
async fn test_early_candidates_bounded() {
    init_tracing();

    let mut bob = TestPeer::with_config("bob", NegotiatorConfig {
        max_early_candidates: 2,
        ..Default::default()
    });

    for candidate in ["c1", "c2", "c3"] {
        bob.candidate_from("alice", candidate).await;
    }

    assert_eq!(bob.negotiator.early_candidate_count(&"alice".into()), 2);
}
