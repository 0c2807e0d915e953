use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// A captured track the local participant publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

/// A track announced by the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

/// Boundary to the camera/microphone layer.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<Vec<LocalTrack>>;
}
