use anyhow::{Result, bail};
use async_trait::async_trait;
use rendezvous_core::{Identity, ServerSignal};
use rendezvous_peer::{LocalTrack, MediaSource, NegotiatorError, NegotiatorEvent};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, TransportCall, audio_track};

struct Microphone;

#[async_trait]
impl MediaSource for Microphone {
    async fn acquire(&self) -> Result<Vec<LocalTrack>> {
        Ok(vec![audio_track("mic-1"), audio_track("mic-2")])
    }
}

struct Unplugged;

#[async_trait]
impl MediaSource for Unplugged {
    async fn acquire(&self) -> Result<Vec<LocalTrack>> {
        bail!("permission denied")
    }
}

#[tokio::test]
async fn test_local_tracks_attached_to_later_sessions() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    let count = alice.negotiator.start_local_media(&Microphone).await.unwrap();
    assert_eq!(count, 2);

    alice.peer_joined("bob").await;

    let calls = alice.factory.transport_for("bob").unwrap().calls();
    assert_eq!(&calls[..3], &[
        TransportCall::AddTrack("mic-1".to_owned()),
        TransportCall::AddTrack("mic-2".to_owned()),
        TransportCall::CreateOffer,
    ]);
}

#[tokio::test]
async fn test_media_failure_not_retried() {
    init_tracing();

    let mut alice = TestPeer::new("alice");
    alice.peer_joined("bob").await;

    let result = alice.negotiator.start_local_media(&Unplugged).await;

    assert!(matches!(result, Err(NegotiatorError::MediaAcquisition(_))));
    assert!(alice.emitted().iter().any(|event| matches!(
        event,
        NegotiatorEvent::MediaUnavailable { reason } if reason.contains("permission denied")
    )));
    // The session itself is untouched.
    assert_eq!(
        alice.state("bob"),
        Some(rendezvous_peer::NegotiationState::OfferSent)
    );
}

#[tokio::test]
async fn test_running_negotiator_starts_media() {
    init_tracing();

    let TestPeer {
        negotiator,
        factory,
        outbox: _outbox,
        mut events,
        ..
    } = TestPeer::new("alice");
    let handle = negotiator.spawn();

    handle.start_media(Arc::new(Unplugged)).unwrap();
    let unavailable = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if let NegotiatorEvent::MediaUnavailable { reason } = event {
                return Some(reason);
            }
        }
        None
    })
    .await
    .unwrap();
    assert!(unavailable.unwrap().contains("permission denied"));

    handle.start_media(Arc::new(Microphone)).unwrap();
    handle
        .signal(ServerSignal::UserJoined {
            identity: Identity::from("bob"),
        })
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if matches!(event, NegotiatorEvent::StateChanged { .. }) {
                break;
            }
        }
    })
    .await
    .unwrap();

    let calls = factory.transport_for("bob").unwrap().calls();
    assert_eq!(&calls[..2], &[
        TransportCall::AddTrack("mic-1".to_owned()),
        TransportCall::AddTrack("mic-2".to_owned()),
    ]);

    handle.shutdown().unwrap();
}
