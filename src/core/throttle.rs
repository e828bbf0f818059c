//! Per-message alert throttling.
//!
//! At camera frame rates a sustained anomaly would otherwise raise the same
//! alert dozens of times per second. Each distinct message text has its own
//! window, measured on the monotonic clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AlertThrottler {
    window: Duration,
    last_dispatched: HashMap<String, Instant>,
}

impl AlertThrottler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_dispatched: HashMap::new(),
        }
    }

    /// Decide whether `message` may be dispatched at `now`, recording it if so.
    ///
    /// An instant earlier than the last recorded one counts as zero elapsed
    /// time, so recorded timestamps never move backwards.
    pub fn admit(&mut self, message: &str, now: Instant) -> bool {
        if let Some(last) = self.last_dispatched.get(message) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        self.last_dispatched.insert(message.to_string(), now);
        true
    }

    /// When `message` was last let through.
    pub fn last_dispatched(&self, message: &str) -> Option<Instant> {
        self.last_dispatched.get(message).copied()
    }
}
