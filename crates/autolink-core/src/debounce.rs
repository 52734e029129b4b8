use tokio::time::{Duration, Instant};

/// Cancelable debounce timer for text-change events.
///
/// Every `touch` restarts the delay, so a burst of keystrokes produces a
/// single evaluation once typing pauses. The owner polls `take_ready` (or
/// sleeps until `deadline`) on its own event loop.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Record an event at `now`, superseding any pending one.
    pub fn touch(&mut self, now: Instant) {
        self.pending = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending evaluation becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|last| last + self.delay)
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Consume the pending evaluation if it is due.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
