//! Schedule-replacing deferred task for the serializer.
//!
//! Time is passed in explicitly (milliseconds from any monotonic origin), so
//! the shell drives it from its own clock and tests drive it by hand.

#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    /// Request a run `window_ms` after `now_ms`, superseding any pending one.
    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.window_ms));
    }

    /// Whether the pending run is due. Consumes it when it is.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}
