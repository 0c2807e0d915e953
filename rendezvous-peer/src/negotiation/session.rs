use crate::error::NegotiatorError;
use crate::negotiation::state::NegotiationState;
use crate::transport::{MediaTransport, Subscription};
use anyhow::Result;
use rendezvous_core::{IceCandidate, Identity, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Negotiation with one remote participant.
pub struct NegotiationSession {
    remote: Identity,
    state: NegotiationState,
    generation: u64,
    transport: Option<Arc<dyn MediaTransport>>,
    subscription: Option<Subscription>,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    max_pending_candidates: usize,
    /// Local tracks changed while an exchange was in flight.
    renegotiate_pending: bool,
    deadline: Option<Instant>,
}

impl NegotiationSession {
    pub fn new(
        remote: Identity,
        generation: u64,
        transport: Arc<dyn MediaTransport>,
        subscription: Subscription,
        max_pending_candidates: usize,
    ) -> Self {
        Self {
            remote,
            state: NegotiationState::Idle,
            generation,
            transport: Some(transport),
            subscription: Some(subscription),
            remote_description_set: false,
            pending_candidates: Vec::new(),
            max_pending_candidates,
            renegotiate_pending: false,
            deadline: None,
        }
    }

    pub fn remote(&self) -> &Identity {
        &self.remote
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending_candidates(&self) -> &[IceCandidate] {
        &self.pending_candidates
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description_set
    }

    pub fn renegotiation_pending(&self) -> bool {
        self.renegotiate_pending
    }

    /// Remember that a fresh offer is owed once the session is connected.
    pub fn request_renegotiation(&mut self) {
        self.renegotiate_pending = true;
    }

    pub fn take_renegotiation(&mut self) -> bool {
        std::mem::take(&mut self.renegotiate_pending)
    }

    pub fn transport(&self) -> Result<Arc<dyn MediaTransport>, NegotiatorError> {
        self.transport
            .clone()
            .ok_or_else(|| NegotiatorError::Released(self.remote.clone()))
    }

    /// Move to `next`. Timed states get a fresh deadline, others clear it.
    pub fn transition(&mut self, next: NegotiationState, now: Instant, timeout: Duration) {
        debug!("Session {}: {} -> {}", self.remote, self.state, next);
        self.state = next;
        self.deadline = next.is_timed().then(|| now + timeout);
    }

    pub fn is_overdue(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Apply the remote offer or answer, then flush buffered candidates in
    /// arrival order.
    pub async fn apply_remote_description(&mut self, desc: SessionDescription) -> Result<()> {
        let transport = self.transport()?;
        transport.set_remote_description(desc).await?;
        self.remote_description_set = true;

        let pending = std::mem::take(&mut self.pending_candidates);
        if !pending.is_empty() {
            debug!("Flushing {} buffered candidates for {}", pending.len(), self.remote);
        }
        for candidate in pending {
            if let Err(e) = transport.add_ice_candidate(candidate).await {
                warn!("Dropping candidate from {}: {:#}", self.remote, e);
            }
        }
        Ok(())
    }

    /// Candidates that arrive before any remote description are held back,
    /// up to `max_pending_candidates`.
    pub async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_description_set {
            if self.pending_candidates.len() >= self.max_pending_candidates {
                warn!("Too many buffered candidates from {}, dropping", self.remote);
            } else {
                self.pending_candidates.push(candidate);
            }
            return;
        }

        match self.transport() {
            Ok(transport) => {
                if let Err(e) = transport.add_ice_candidate(candidate).await {
                    warn!("Dropping candidate from {}: {:#}", self.remote, e);
                }
            }
            Err(e) => debug!("Ignoring candidate: {}", e),
        }
    }

    /// Unsubscribe and close the transport. Safe to call twice.
    pub async fn release(&mut self) {
        self.subscription.take();
        self.pending_candidates.clear();
        self.renegotiate_pending = false;
        self.deadline = None;

        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Failed to close transport to {}: {:#}", self.remote, e);
            }
        }
    }
}
