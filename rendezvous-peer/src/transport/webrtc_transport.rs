use crate::media::{LocalTrack, MediaKind, RemoteTrack};
use crate::transport::media_transport::{MediaTransport, TransportFactory};
use crate::transport::subscription::EventSink;
use crate::transport::transport_event::TransportEvent;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use rendezvous_core::utils::default_ice_servers;
use rendezvous_core::{IceCandidate, IceServerConfig, Identity, SdpKind, SessionDescription};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

type SharedSink = Arc<Mutex<Option<EventSink>>>;

/// [`MediaTransport`] backed by a webrtc-rs peer connection.
pub struct WebRtcTransport {
    remote: Identity,
    peer_connection: Arc<RTCPeerConnection>,
    sink: SharedSink,
}

impl WebRtcTransport {
    pub async fn new(remote: Identity, ice_servers: &[IceServerConfig]) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let sink: SharedSink = Arc::new(Mutex::new(None));

        let state_sink = sink.clone();
        let remote_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                let remote = remote_state.clone();

                Box::pin(async move {
                    info!("Peer connection to {} is now {:?}", remote, s);
                    if s == RTCPeerConnectionState::Failed {
                        emit(&sink, TransportEvent::Failed("peer connection failed".to_owned()));
                    }
                })
            },
        ));

        let ice_sink = sink.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                emit(&sink, TransportEvent::IceCandidate(from_rtc_candidate(init)));
            })
        }));

        let track_sink = sink.clone();
        let remote_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let sink = track_sink.clone();
                let remote = remote_track.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        _ => MediaKind::Video,
                    };
                    debug!("Remote {:?} track {} from {}", kind, track.id(), remote);
                    emit(
                        &sink,
                        TransportEvent::Track(RemoteTrack {
                            id: track.id(),
                            stream_id: track.stream_id(),
                            kind,
                        }),
                    );
                })
            },
        ));

        let negotiation_sink = sink.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let sink = negotiation_sink.clone();
            Box::pin(async move {
                emit(&sink, TransportEvent::NegotiationNeeded);
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
            sink,
        })
    }
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc_description(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc_description(&answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)
            .with_context(|| format!("Invalid remote description from {}", self.remote))?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn add_track(&self, track: LocalTrack) -> Result<()> {
        let mime_type = match track.kind {
            MediaKind::Audio => MIME_TYPE_OPUS,
            MediaKind::Video => MIME_TYPE_VP8,
        };
        let local: Arc<dyn TrackLocal + Send + Sync> = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id,
            track.stream_id,
        ));
        self.peer_connection.add_track(local).await?;
        Ok(())
    }

    fn subscribe(&self, sink: EventSink) {
        match self.sink.lock() {
            Ok(mut guard) => *guard = Some(sink),
            Err(_) => warn!("Event sink for {} is poisoned", self.remote),
        }
    }

    async fn close(&self) -> Result<()> {
        if let Ok(mut guard) = self.sink.lock() {
            guard.take();
        }
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Builds a [`WebRtcTransport`] per remote participant.
#[derive(Debug, Default, Clone)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        remote: &Identity,
        ice_servers: &[IceServerConfig],
    ) -> Result<Arc<dyn MediaTransport>> {
        let transport = if ice_servers.is_empty() {
            WebRtcTransport::new(remote.clone(), &default_ice_servers()).await?
        } else {
            WebRtcTransport::new(remote.clone(), ice_servers).await?
        };
        Ok(Arc::new(transport))
    }
}

fn emit(sink: &Mutex<Option<EventSink>>, event: TransportEvent) {
    if let Ok(guard) = sink.lock() {
        if let Some(sink) = guard.as_ref() {
            sink.emit(event);
        }
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        // No constructor for rollback; it carries no SDP to parse.
        SdpKind::Rollback => {
            serde_json::from_value(serde_json::json!({ "type": "rollback", "sdp": "" }))?
        }
    };
    Ok(desc)
}

fn from_rtc_description(desc: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        RTCSdpType::Unspecified => bail!("description has no type"),
    };
    Ok(SessionDescription {
        kind,
        sdp: desc.sdp.clone(),
    })
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
