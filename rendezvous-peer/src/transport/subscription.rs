use crate::transport::transport_event::TransportEvent;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Deliver = dyn Fn(TransportEvent) + Send + Sync;

/// Handed to a transport so it can raise events. Goes quiet once the
/// matching [`Subscription`] is dropped.
#[derive(Clone)]
pub struct EventSink {
    active: Arc<AtomicBool>,
    deliver: Arc<Deliver>,
}

impl EventSink {
    /// Returns false if the event was discarded.
    pub fn emit(&self, event: TransportEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        (self.deliver)(event);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owner side of a transport callback registration.
#[derive(Debug)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn new<F>(deliver: F) -> (Self, EventSink)
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let sink = EventSink {
            active: active.clone(),
            deliver: Arc::new(deliver),
        };
        (Self { active }, sink)
    }

    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
