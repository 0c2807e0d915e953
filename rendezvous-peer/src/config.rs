use std::time::Duration;

pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_EARLY_CANDIDATES: usize = 64;

#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
    /// How long an offer or answer may stay unanswered before the session fails.
    pub negotiation_timeout: Duration,
    /// Cap on remote candidates held back per peer, both before its
    /// session exists and before a remote description is applied.
    pub max_early_candidates: usize,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
            max_early_candidates: DEFAULT_MAX_EARLY_CANDIDATES,
        }
    }
}
