use crate::media::LocalTrack;
use crate::transport::subscription::EventSink;
use anyhow::Result;
use async_trait::async_trait;
use rendezvous_core::{IceCandidate, IceServerConfig, Identity, SessionDescription};
use std::sync::Arc;

/// One peer connection toward one remote participant.
///
/// Description and candidate payloads are opaque to the negotiator; the
/// transport is the only thing that parses them.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Only valid after a remote offer has been applied.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_track(&self, track: LocalTrack) -> Result<()>;

    /// Replaces any earlier sink.
    fn subscribe(&self, sink: EventSink);

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: &Identity,
        ice_servers: &[IceServerConfig],
    ) -> Result<Arc<dyn MediaTransport>>;
}
