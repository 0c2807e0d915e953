use crate::error::ProtocolError;
use crate::model::{IceCandidate, Identity, RoomId, SdpKind, SessionDescription};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Frames a participant sends to the relay.
///
/// Wire shape: `{"event": "call-user", "data": {"targetIdentity": "...", "offer": {...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientSignal {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(alias = "emailId")]
        identity: Identity,
        room_id: RoomId,
    },
    #[serde(rename_all = "camelCase")]
    CallUser {
        #[serde(alias = "emailId")]
        target_identity: Identity,
        offer: SessionDescription,
    },
    #[serde(rename_all = "camelCase")]
    CallAccepted {
        #[serde(alias = "emailId")]
        target_identity: Identity,
        #[serde(alias = "ans")]
        answer: SessionDescription,
    },
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        #[serde(alias = "emailId")]
        target_identity: Identity,
        candidate: IceCandidate,
    },
    LeaveRoom,
}

impl ClientSignal {
    /// Decode a text frame and reject frames with blank or mistyped fields.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let signal: Self = serde_json::from_str(text)?;
        signal.validate()?;
        Ok(signal)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ClientSignal::JoinRoom { .. } => "join-room",
            ClientSignal::CallUser { .. } => "call-user",
            ClientSignal::CallAccepted { .. } => "call-accepted",
            ClientSignal::IceCandidate { .. } => "ice-candidate",
            ClientSignal::LeaveRoom => "leave-room",
        }
    }

    /// Relay target, for the three forwarding events.
    pub fn target(&self) -> Option<&Identity> {
        match self {
            ClientSignal::CallUser {
                target_identity, ..
            }
            | ClientSignal::CallAccepted {
                target_identity, ..
            }
            | ClientSignal::IceCandidate {
                target_identity, ..
            } => Some(target_identity),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientSignal::JoinRoom { identity, room_id } => {
                if identity.is_blank() {
                    return Err(ProtocolError::Malformed("identity is empty".into()));
                }
                if room_id.is_blank() {
                    return Err(ProtocolError::Malformed("roomId is empty".into()));
                }
            }
            ClientSignal::CallUser { offer, .. } => {
                expect_kind(offer, SdpKind::Offer, "call-user")?;
            }
            ClientSignal::CallAccepted { answer, .. } => {
                expect_kind(answer, SdpKind::Answer, "call-accepted")?;
            }
            ClientSignal::IceCandidate { .. } | ClientSignal::LeaveRoom => {}
        }

        match self.target() {
            Some(target) if target.is_blank() => Err(ProtocolError::Malformed(format!(
                "{} without targetIdentity",
                self.event_name()
            ))),
            _ => Ok(()),
        }
    }
}

fn expect_kind(
    desc: &SessionDescription,
    kind: SdpKind,
    event: &str,
) -> Result<(), ProtocolError> {
    if desc.kind == kind {
        Ok(())
    } else {
        Err(ProtocolError::Malformed(format!(
            "{} carries a {:?} description",
            event, desc.kind
        )))
    }
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerSignal {
    #[serde(rename_all = "camelCase")]
    IceConfig { ice_servers: Vec<IceServerConfig> },
    #[serde(rename_all = "camelCase")]
    JoinedRoom { room_id: RoomId },
    UserJoined { identity: Identity },
    UserLeft { identity: Identity },
    IncomingCall {
        from: Identity,
        offer: SessionDescription,
    },
    CallAccepted {
        from: Identity,
        answer: SessionDescription,
    },
    IceCandidate {
        from: Identity,
        candidate: IceCandidate,
    },
    #[serde(rename_all = "camelCase")]
    DeliveryFailed {
        target_identity: Identity,
        event: String,
    },
    Error { reason: String },
}

impl ServerSignal {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
