use std::time::Duration;

/// Bounded exponential backoff for reconnect attempts.
///
/// The delay starts at `base`, doubles per consecutive attempt, and never
/// exceeds `cap`. Attempt count is not limited — a gateway left alone should
/// keep trying to recover from transient disconnects.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            next: base,
        }
    }

    /// Delay to apply before the next attempt, advancing the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.cap);
        delay
    }

    /// Called when a connection opens: the next failure starts over at `base`.
    pub fn reset(&mut self) {
        self.next = self.base;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}
