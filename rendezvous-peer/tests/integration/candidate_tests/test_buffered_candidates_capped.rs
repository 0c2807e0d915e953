use rendezvous_core::{IceCandidate, SessionDescription};
use rendezvous_peer::NegotiatorConfig;

use crate::integration::init_tracing;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_buffered_candidates_capped() {
    init_tracing();

    let mut alice = TestPeer::with_config("alice", NegotiatorConfig {
        max_early_candidates: 2,
        ..Default::default()
    });
    alice.peer_joined("bob").await;

    for candidate in ["c1", "c2", "c3"] {
        alice.candidate_from("bob", candidate).await;
    }

    let session = alice.negotiator.session(&"bob".into()).unwrap();
    assert_eq!(session.pending_candidates(), &[
        IceCandidate::new("c1"),
        IceCandidate::new("c2"),
    ]);

    alice
        .answer_from("bob", SessionDescription::answer("bob-answer-1"))
        .await;

    let transport = alice.factory.transport_for("bob").unwrap();
    assert_eq!(transport.applied_candidates(), vec![
        IceCandidate::new("c1"),
        IceCandidate::new("c2"),
    ]);

    // Once the description is set candidates bypass the buffer.
    alice.candidate_from("bob", "c4").await;
    assert_eq!(transport.applied_candidates().len(), 3);
}
