use rendezvous_core::Identity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NegotiatorError {
    #[error("transport for '{remote}' failed: {reason}")]
    Transport { remote: Identity, reason: String },

    /// The device layer could not provide local media. Not retried.
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),

    #[error("signaling channel closed")]
    SignalChannelClosed,

    #[error("negotiator is no longer running")]
    NegotiatorClosed,

    #[error("no negotiation session for '{0}'")]
    UnknownSession(Identity),

    #[error("session for '{0}' has already released its transport")]
    Released(Identity),
}

impl NegotiatorError {
    pub(crate) fn transport(remote: &Identity, err: anyhow::Error) -> Self {
        Self::Transport {
            remote: remote.clone(),
            reason: format!("{:#}", err),
        }
    }
}
