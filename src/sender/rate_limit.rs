//! Drop-based send gate.
//!
//! Not a token bucket: there is no burst allowance and nothing is queued.
//! An attempt inside the interval is discarded by the caller.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        *self.last_attempt.lock()
    }

    pub fn should_send(&self, now: Instant) -> bool {
        self.allows(*self.last_attempt.lock(), now)
    }

    /// Sets a new baseline. Never moves the baseline backwards.
    pub fn record_attempt(&self, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        let mut last = self.last_attempt.lock();
        if last.is_none_or(|previous| now > previous) {
            *last = Some(now);
        }
    }

    /// Checks and records under one lock so two concurrent callers cannot
    /// both pass the gate.
    pub fn try_acquire(&self, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut last = self.last_attempt.lock();
        if !self.allows(*last, now) {
            return false;
        }
        if last.is_none_or(|previous| now > previous) {
            *last = Some(now);
        }
        true
    }

    fn allows(&self, last: Option<Instant>, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }
        match last {
            None => true,
            Some(previous) => now.saturating_duration_since(previous) >= self.interval,
        }
    }
}
