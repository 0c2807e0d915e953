use std::fmt;

/// Where one pairwise negotiation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Connected,
    /// A fresh offer is out on an already connected session.
    Renegotiating,
    /// Terminal. Only a new `user-joined` or `incoming-call` starts over.
    Failed,
}

impl NegotiationState {
    /// States in which a local offer is waiting for its answer.
    pub fn awaiting_answer(self) -> bool {
        matches!(self, Self::OfferSent | Self::Renegotiating)
    }

    /// States that put a deadline on the session: a local offer nobody
    /// has answered yet.
    pub fn is_timed(self) -> bool {
        self.awaiting_answer()
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OfferSent => "offer-sent",
            Self::OfferReceived => "offer-received",
            Self::AnswerSent => "answer-sent",
            Self::Connected => "connected",
            Self::Renegotiating => "renegotiating",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
