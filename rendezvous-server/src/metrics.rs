use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Relay counters. Dropped relays are counted here instead of vanishing.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    relayed: AtomicU64,
    unresolved: AtomicU64,
    not_joined: AtomicU64,
    malformed: AtomicU64,
    joins: AtomicU64,
    leaves: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub relayed: u64,
    pub unresolved: u64,
    pub not_joined: u64,
    pub malformed: u64,
    pub joins: u64,
    pub leaves: u64,
}

impl RelayMetrics {
    pub fn record_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_joined(&self) {
        self.not_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leave(&self) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            relayed: self.relayed.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            not_joined: self.not_joined.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
        }
    }
}
