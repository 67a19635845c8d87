//! # Reconnect Backoff
//!
//! Pure delay arithmetic for the reconnect policy: exponential doubling from
//! an initial delay up to a cap, reset to the initial value once a session
//! reaches `connected`. The connection manager owns the timers; this type
//! only answers "how long until the next attempt".

use std::time::Duration;

/// Capped exponential backoff state.
#[derive(Debug)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            next: initial,
        }
    }

    /// Delay to wait before the next connect attempt. Doubles the stored
    /// delay for the attempt after, saturating at the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    /// Reset to the initial delay. Called when a session reaches `connected`.
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}
