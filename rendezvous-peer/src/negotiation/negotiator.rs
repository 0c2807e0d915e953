use crate::config::NegotiatorConfig;
use crate::error::NegotiatorError;
use crate::media::{LocalTrack, MediaSource};
use crate::negotiation::negotiator_handle::NegotiatorHandle;
use crate::negotiation::negotiator_input::{NegotiatorEvent, NegotiatorInput};
use crate::negotiation::session::NegotiationSession;
use crate::negotiation::state::NegotiationState;
use crate::signal_sink::SignalSink;
use crate::transport::{MediaTransport, Subscription, TransportEvent, TransportFactory};
use rendezvous_core::{
    ClientSignal, IceCandidate, IceServerConfig, Identity, RoomId, ServerSignal,
    SessionDescription,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const CALL_USER_EVENT: &str = "call-user";

/// Drives one [`NegotiationSession`] per remote participant for a single
/// local identity.
///
/// Every input (relay frames, transport callbacks, local commands) goes
/// through one queue and is handled to completion before the next one,
/// so a session never sees two transitions interleave.
pub struct SessionNegotiator {
    local: Identity,
    config: NegotiatorConfig,
    factory: Arc<dyn TransportFactory>,
    signals: Arc<dyn SignalSink>,
    sessions: HashMap<Identity, NegotiationSession>,
    early_candidates: HashMap<Identity, Vec<IceCandidate>>,
    local_tracks: Vec<LocalTrack>,
    ice_servers: Vec<IceServerConfig>,
    next_generation: u64,
    input_tx: mpsc::UnboundedSender<NegotiatorInput>,
    input_rx: mpsc::UnboundedReceiver<NegotiatorInput>,
    event_tx: mpsc::UnboundedSender<NegotiatorEvent>,
}

impl SessionNegotiator {
    pub fn new(
        local: Identity,
        config: NegotiatorConfig,
        factory: Arc<dyn TransportFactory>,
        signals: Arc<dyn SignalSink>,
    ) -> (Self, mpsc::UnboundedReceiver<NegotiatorEvent>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let negotiator = Self {
            local,
            config,
            factory,
            signals,
            sessions: HashMap::new(),
            early_candidates: HashMap::new(),
            local_tracks: Vec::new(),
            ice_servers: Vec::new(),
            next_generation: 0,
            input_tx,
            input_rx,
            event_tx,
        };
        (negotiator, event_rx)
    }

    pub fn handle(&self) -> NegotiatorHandle {
        NegotiatorHandle::new(self.input_tx.clone())
    }

    /// Run the loop on the current runtime.
    pub fn spawn(self) -> NegotiatorHandle {
        let handle = self.handle();
        tokio::spawn(self.run());
        handle
    }

    pub fn local_identity(&self) -> &Identity {
        &self.local
    }

    pub fn state(&self, remote: &Identity) -> Option<NegotiationState> {
        self.sessions.get(remote).map(|s| s.state())
    }

    pub fn session(&self, remote: &Identity) -> Option<&NegotiationSession> {
        self.sessions.get(remote)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn early_candidate_count(&self, remote: &Identity) -> usize {
        self.early_candidates.get(remote).map_or(0, Vec::len)
    }

    pub async fn run(mut self) {
        info!("Negotiator for {} started", self.local);

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                input = self.input_rx.recv() => match input {
                    Some(input) => {
                        if !self.handle_input(input).await {
                            break;
                        }
                    }
                    None => break,
                },
                _ = wait_until(deadline) => self.expire_overdue(Instant::now()).await,
            }
        }

        self.close_all().await;
        info!("Negotiator for {} finished", self.local);
    }

    /// Handle whatever is already queued without waiting for more.
    /// Returns false once a shutdown was consumed.
    pub async fn drain_inputs(&mut self) -> bool {
        while let Ok(input) = self.input_rx.try_recv() {
            if !self.handle_input(input).await {
                return false;
            }
        }
        true
    }

    pub async fn handle_input(&mut self, input: NegotiatorInput) -> bool {
        match input {
            NegotiatorInput::Join(room_id) => {
                if let Err(e) = self.join(room_id).await {
                    error!("Failed to join: {}", e);
                }
            }
            NegotiatorInput::Leave => {
                if let Err(e) = self.leave().await {
                    error!("Failed to leave: {}", e);
                }
            }
            NegotiatorInput::Signal(signal) => self.handle_signal(signal).await,
            NegotiatorInput::Transport {
                remote,
                generation,
                event,
            } => self.handle_transport_event(remote, generation, event).await,
            NegotiatorInput::AddTrack(track) => self.add_track(track).await,
            NegotiatorInput::StartMedia(source) => {
                if let Ok(count) = self.start_local_media(source.as_ref()).await {
                    debug!("Local media yielded {} tracks", count);
                }
            }
            NegotiatorInput::EndCall(remote) => self.end_call(&remote).await,
            NegotiatorInput::Shutdown => return false,
        }
        true
    }

    pub async fn join(&mut self, room_id: RoomId) -> Result<(), NegotiatorError> {
        info!("{} joining room {}", self.local, room_id);
        self.signals
            .send_signal(ClientSignal::JoinRoom {
                identity: self.local.clone(),
                room_id,
            })
            .await
    }

    /// Leave the room and hang up on everyone.
    pub async fn leave(&mut self) -> Result<(), NegotiatorError> {
        self.close_all().await;
        self.signals.send_signal(ClientSignal::LeaveRoom).await
    }

    pub async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::IceConfig { ice_servers } => {
                debug!("Using {} ICE servers from relay", ice_servers.len());
                self.ice_servers = ice_servers;
            }
            ServerSignal::JoinedRoom { room_id } => {
                info!("{} joined room {}", self.local, room_id);
                self.emit(NegotiatorEvent::Joined { room_id });
            }
            ServerSignal::UserJoined { identity } => self.on_user_joined(identity).await,
            ServerSignal::UserLeft { identity } => {
                info!("{} left", identity);
                self.early_candidates.remove(&identity);
                self.close_session(&identity).await;
            }
            ServerSignal::IncomingCall { from, offer } => self.on_incoming_call(from, offer).await,
            ServerSignal::CallAccepted { from, answer } => {
                self.on_call_accepted(from, answer).await
            }
            ServerSignal::IceCandidate { from, candidate } => {
                self.on_remote_candidate(from, candidate).await
            }
            ServerSignal::DeliveryFailed {
                target_identity,
                event,
            } => self.on_delivery_failed(target_identity, &event).await,
            ServerSignal::Error { reason } => {
                warn!("Relay rejected a frame: {}", reason);
                self.emit(NegotiatorEvent::ServerError { reason });
            }
        }
    }

    pub async fn handle_transport_event(
        &mut self,
        remote: Identity,
        generation: u64,
        event: TransportEvent,
    ) {
        let Some(session) = self.sessions.get(&remote) else {
            debug!("Transport event for unknown session {}", remote);
            return;
        };
        let state = session.state();
        if session.generation() != generation || state == NegotiationState::Failed {
            debug!("Stale transport event for {}", remote);
            return;
        }

        match event {
            TransportEvent::IceCandidate(candidate) => {
                let signal = ClientSignal::IceCandidate {
                    target_identity: remote.clone(),
                    candidate,
                };
                if let Err(e) = self.signals.send_signal(signal).await {
                    warn!("Could not trickle candidate to {}: {}", remote, e);
                }
            }
            TransportEvent::Track(track) => {
                self.emit(NegotiatorEvent::RemoteTrack {
                    remote: remote.clone(),
                    track,
                });
                if state == NegotiationState::AnswerSent {
                    self.enter_connected(&remote).await;
                }
            }
            TransportEvent::NegotiationNeeded => {
                if state == NegotiationState::Connected {
                    self.send_offer(&remote, NegotiationState::Renegotiating).await;
                } else if let Some(session) = self.sessions.get_mut(&remote) {
                    debug!("Negotiation with {} deferred while {}", remote, state);
                    session.request_renegotiation();
                }
            }
            TransportEvent::Failed(reason) => self.fail(&remote, reason).await,
        }
    }

    /// Publish a local track on every live session and on every later one.
    pub async fn add_track(&mut self, track: LocalTrack) {
        info!("Publishing {:?} track {}", track.kind, track.id);
        self.local_tracks.push(track.clone());

        for session in self.sessions.values() {
            if session.state() == NegotiationState::Failed {
                continue;
            }
            let Ok(transport) = session.transport() else {
                continue;
            };
            if let Err(e) = transport.add_track(track.clone()).await {
                warn!("Could not add track to {}: {:#}", session.remote(), e);
            }
        }
    }

    /// Acquire local media once and publish every track it yields.
    pub async fn start_local_media(
        &mut self,
        source: &dyn MediaSource,
    ) -> Result<usize, NegotiatorError> {
        match source.acquire().await {
            Ok(tracks) => {
                let count = tracks.len();
                for track in tracks {
                    self.add_track(track).await;
                }
                Ok(count)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("Local media unavailable: {}", reason);
                self.emit(NegotiatorEvent::MediaUnavailable {
                    reason: reason.clone(),
                });
                Err(NegotiatorError::MediaAcquisition(reason))
            }
        }
    }

    pub async fn end_call(&mut self, remote: &Identity) {
        self.early_candidates.remove(remote);
        self.close_session(remote).await;
    }

    /// Fail every session whose deadline is at or before `now`.
    pub async fn expire_overdue(&mut self, now: Instant) {
        let overdue: Vec<(Identity, NegotiationState)> = self
            .sessions
            .values()
            .filter(|s| s.is_overdue(now))
            .map(|s| (s.remote().clone(), s.state()))
            .collect();

        for (remote, state) in overdue {
            self.fail(&remote, format!("timed out in {}", state)).await;
        }
    }

    async fn on_user_joined(&mut self, identity: Identity) {
        if identity == self.local {
            return;
        }

        match self.state(&identity) {
            None | Some(NegotiationState::Idle) => {}
            Some(NegotiationState::Failed) => self.discard(&identity).await,
            Some(state) => {
                debug!("Already negotiating with {} ({})", identity, state);
                return;
            }
        }

        if let Err(e) = self.ensure_session(&identity).await {
            self.fail(&identity, e.to_string()).await;
            return;
        }
        self.send_offer(&identity, NegotiationState::OfferSent).await;
    }

    async fn on_incoming_call(&mut self, from: Identity, offer: SessionDescription) {
        if from == self.local {
            warn!("Ignoring offer addressed from own identity");
            return;
        }

        if self.state(&from) == Some(NegotiationState::Failed) {
            self.discard(&from).await;
        }

        let mut settled = NegotiationState::AnswerSent;
        match self.state(&from) {
            None => {
                if let Err(e) = self.open_session(&from).await {
                    self.fail(&from, e.to_string()).await;
                    return;
                }
            }
            Some(state) if state.awaiting_answer() => {
                if self.local < from {
                    info!("Glare with {}: keeping our offer", from);
                    self.emit(NegotiatorEvent::Glare {
                        remote: from,
                        kept_offer: true,
                    });
                    return;
                }

                info!("Glare with {}: withdrawing our offer", from);
                self.emit(NegotiatorEvent::Glare {
                    remote: from.clone(),
                    kept_offer: false,
                });
                if let Err(e) = self.rollback(&from).await {
                    self.fail(&from, e.to_string()).await;
                    return;
                }
                if state == NegotiationState::Renegotiating {
                    // The withdrawn offer carried local changes.
                    if let Some(session) = self.sessions.get_mut(&from) {
                        session.request_renegotiation();
                    }
                    settled = NegotiationState::Connected;
                }
            }
            Some(NegotiationState::Connected) => settled = NegotiationState::Connected,
            Some(_) => {}
        }

        self.answer(&from, offer, settled).await;
    }

    async fn on_call_accepted(&mut self, from: Identity, answer: SessionDescription) {
        let Some(state) = self.state(&from) else {
            warn!("Answer from {} without a session", from);
            return;
        };
        if !state.awaiting_answer() {
            warn!("Ignoring stale answer from {} while {}", from, state);
            return;
        }

        let applied = match self.sessions.get_mut(&from) {
            Some(session) => session.apply_remote_description(answer).await,
            None => return,
        };
        match applied {
            Ok(()) => self.enter_connected(&from).await,
            Err(e) => {
                self.fail(&from, format!("rejected remote answer: {:#}", e))
                    .await
            }
        }
    }

    async fn on_remote_candidate(&mut self, from: Identity, candidate: IceCandidate) {
        match self.sessions.get_mut(&from) {
            Some(session) if session.state() == NegotiationState::Failed => {
                debug!("Dropping candidate for failed session {}", from);
            }
            Some(session) => session.add_remote_candidate(candidate).await,
            None => {
                let limit = self.config.max_early_candidates;
                let held = self.early_candidates.entry(from.clone()).or_default();
                if held.len() >= limit {
                    warn!("Too many early candidates from {}, dropping", from);
                } else {
                    held.push(candidate);
                }
            }
        }
    }

    async fn on_delivery_failed(&mut self, target: Identity, event: &str) {
        let awaiting = self
            .state(&target)
            .is_some_and(NegotiationState::awaiting_answer);

        if event == CALL_USER_EVENT && awaiting {
            self.fail(&target, format!("offer to {} was undeliverable", target))
                .await;
        } else {
            debug!("Relay could not deliver {} to {}", event, target);
        }
    }

    async fn send_offer(&mut self, remote: &Identity, next: NegotiationState) {
        match self.offer(remote).await {
            Ok(()) => self.transition(remote, next),
            Err(e) => self.fail(remote, e.to_string()).await,
        }
    }

    /// Settle on `Connected`, then send any offer that was held back
    /// while the previous exchange was in flight.
    async fn enter_connected(&mut self, remote: &Identity) {
        self.transition(remote, NegotiationState::Connected);
        let pending = self
            .sessions
            .get_mut(remote)
            .is_some_and(|session| session.take_renegotiation());
        if pending {
            info!("Offering deferred changes to {}", remote);
            self.send_offer(remote, NegotiationState::Renegotiating).await;
        }
    }

    async fn offer(&self, remote: &Identity) -> Result<(), NegotiatorError> {
        let transport = self.session_transport(remote)?;
        let offer = transport
            .create_offer()
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))?;
        transport
            .set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))?;

        debug!("Sending offer to {}", remote);
        self.signals
            .send_signal(ClientSignal::CallUser {
                target_identity: remote.clone(),
                offer,
            })
            .await
    }

    async fn answer(
        &mut self,
        remote: &Identity,
        offer: SessionDescription,
        settled: NegotiationState,
    ) {
        let applied = match self.sessions.get_mut(remote) {
            Some(session) => session.apply_remote_description(offer).await,
            None => return,
        };
        if let Err(e) = applied {
            self.fail(remote, format!("rejected remote offer: {:#}", e))
                .await;
            return;
        }
        if settled != NegotiationState::Connected {
            self.transition(remote, NegotiationState::OfferReceived);
        }

        match self.reply(remote).await {
            Ok(()) if settled == NegotiationState::Connected => {
                self.enter_connected(remote).await
            }
            Ok(()) => self.transition(remote, settled),
            Err(e) => self.fail(remote, e.to_string()).await,
        }
    }

    async fn reply(&self, remote: &Identity) -> Result<(), NegotiatorError> {
        let transport = self.session_transport(remote)?;
        let answer = transport
            .create_answer()
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))?;
        transport
            .set_local_description(answer.clone())
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))?;

        debug!("Sending answer to {}", remote);
        self.signals
            .send_signal(ClientSignal::CallAccepted {
                target_identity: remote.clone(),
                answer,
            })
            .await
    }

    async fn rollback(&self, remote: &Identity) -> Result<(), NegotiatorError> {
        let transport = self.session_transport(remote)?;
        transport
            .set_local_description(SessionDescription::rollback())
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))
    }

    async fn ensure_session(&mut self, remote: &Identity) -> Result<(), NegotiatorError> {
        if self.sessions.contains_key(remote) {
            return Ok(());
        }
        self.open_session(remote).await
    }

    async fn open_session(&mut self, remote: &Identity) -> Result<(), NegotiatorError> {
        let transport = self
            .factory
            .create(remote, &self.ice_servers)
            .await
            .map_err(|e| NegotiatorError::transport(remote, e))?;

        let generation = self.next_generation;
        self.next_generation += 1;

        let input_tx = self.input_tx.clone();
        let source = remote.clone();
        let (subscription, sink) = Subscription::new(move |event| {
            let _ = input_tx.send(NegotiatorInput::Transport {
                remote: source.clone(),
                generation,
                event,
            });
        });
        transport.subscribe(sink);

        for track in &self.local_tracks {
            if let Err(e) = transport.add_track(track.clone()).await {
                warn!("Could not add track {} for {}: {:#}", track.id, remote, e);
            }
        }

        let mut session = NegotiationSession::new(
            remote.clone(),
            generation,
            transport,
            subscription,
            self.config.max_early_candidates,
        );
        for candidate in self.early_candidates.remove(remote).unwrap_or_default() {
            session.add_remote_candidate(candidate).await;
        }

        info!("Opened session with {}", remote);
        self.sessions.insert(remote.clone(), session);
        Ok(())
    }

    fn session_transport(
        &self,
        remote: &Identity,
    ) -> Result<Arc<dyn MediaTransport>, NegotiatorError> {
        self.sessions
            .get(remote)
            .ok_or_else(|| NegotiatorError::UnknownSession(remote.clone()))?
            .transport()
    }

    fn transition(&mut self, remote: &Identity, next: NegotiationState) {
        let timeout = self.config.negotiation_timeout;
        let Some(session) = self.sessions.get_mut(remote) else {
            return;
        };
        let changed = session.state() != next;
        session.transition(next, Instant::now(), timeout);

        if changed {
            let _ = self.event_tx.send(NegotiatorEvent::StateChanged {
                remote: remote.clone(),
                state: next,
            });
        }
    }

    /// Release the transport and park the session in `Failed`.
    async fn fail(&mut self, remote: &Identity, reason: String) {
        warn!("Negotiation with {} failed: {}", remote, reason);
        if let Some(session) = self.sessions.get_mut(remote) {
            session.release().await;
        }
        self.transition(remote, NegotiationState::Failed);
        self.emit(NegotiatorEvent::SessionFailed {
            remote: remote.clone(),
            reason,
        });
    }

    async fn discard(&mut self, remote: &Identity) {
        if let Some(mut session) = self.sessions.remove(remote) {
            session.release().await;
        }
    }

    async fn close_session(&mut self, remote: &Identity) {
        if let Some(mut session) = self.sessions.remove(remote) {
            session.release().await;
            info!("Closed session with {}", remote);
            self.emit(NegotiatorEvent::SessionClosed {
                remote: remote.clone(),
            });
        }
    }

    async fn close_all(&mut self) {
        let remotes: Vec<Identity> = self.sessions.keys().cloned().collect();
        for remote in remotes {
            self.close_session(&remote).await;
        }
        self.early_candidates.clear();
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(|s| s.deadline()).min()
    }

    fn emit(&self, event: NegotiatorEvent) {
        let _ = self.event_tx.send(event);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
