use rendezvous_core::{IceCandidate, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_candidates_buffered_until_description() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    alice.peer_joined("bob").await;

    alice.candidate_from("bob", "c1").await;
    alice.candidate_from("bob", "c2").await;

    let transport = alice.factory.transport_for("bob").unwrap();
    assert!(transport.applied_candidates().is_empty());
    assert_eq!(
        alice
            .negotiator
            .session(&"bob".into())
            .unwrap()
            .pending_candidates()
            .len(),
        2
    );

    alice
        .answer_from("bob", SessionDescription::answer("bob-answer-1"))
        .await;

    assert_eq!(
        transport.applied_candidates(),
        vec![IceCandidate::new("c1"), IceCandidate::new("c2")],
        "buffered candidates are applied in arrival order"
    );

    alice.candidate_from("bob", "c3").await;
    assert_eq!(transport.applied_candidates().len(), 3);
    assert!(
        alice
            .negotiator
            .session(&"bob".into())
            .unwrap()
            .pending_candidates()
            .is_empty()
    );
}
