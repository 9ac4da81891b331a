use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[cfg(test)]
use mockall::automock;

/// Time source for the rate limiter and bulk batch timestamps.
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    /// Monotonic instant used for rate limiting.
    fn now(&self) -> Instant;

    /// Current Unix time in whole seconds.
    fn unix_seconds(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
