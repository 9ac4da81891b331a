use crate::domain::{Outcome, OutcomeKind};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const MAX_LATENCY_SAMPLES: usize = 1000;

/// Nearest-rank percentile over already sorted samples.
fn calculate_percentile(sorted_samples: &[Duration], percentile: f64) -> Duration {
    if sorted_samples.is_empty() {
        return Duration::ZERO;
    }

    let percentile = percentile.clamp(0.0, 1.0);
    let last = sorted_samples.len() - 1;
    let index = (percentile * last as f64).floor() as usize;
    sorted_samples[index.min(last)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryMetrics {
    /// Requests that reached the network.
    pub attempts: u64,
    pub successes: u64,
    /// Attempts dropped by the rate limiter.
    pub skipped: u64,
    pub recoverable_failures: u64,
    pub transport_failures: u64,
    /// Non-2xx responses outside the recoverable set.
    pub rejected: u64,
    pub bytes_sent: u64,
    pub average_latency: Duration,
    pub p95_latency: Duration,
    pub p99_latency: Duration,
}

impl DeliveryMetrics {
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Success => self.successes,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::RecoverableFailure => self.recoverable_failures,
            OutcomeKind::FatalFailure => self.transport_failures,
            OutcomeKind::Rejected => self.rejected,
        }
    }
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    attempts: Arc<AtomicU64>,
    successes: Arc<AtomicU64>,
    skipped: Arc<AtomicU64>,
    recoverable_failures: Arc<AtomicU64>,
    transport_failures: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    latency_samples: Arc<Mutex<VecDeque<Duration>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one dispatcher call. `bytes` and `latency`
    /// only count when a request was actually issued.
    pub fn record_outcome(&self, outcome: &Outcome, bytes: usize, latency: Duration) {
        let counter = match outcome.kind() {
            OutcomeKind::Success => &self.successes,
            OutcomeKind::Skipped => &self.skipped,
            OutcomeKind::RecoverableFailure => &self.recoverable_failures,
            OutcomeKind::FatalFailure => &self.transport_failures,
            OutcomeKind::Rejected => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if !outcome.attempted() {
            return;
        }

        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);

        let mut samples = self.latency_samples.lock();
        samples.push_back(latency);
        if samples.len() > MAX_LATENCY_SAMPLES {
            samples.pop_front();
        }
    }

    pub fn snapshot(&self) -> DeliveryMetrics {
        let (average_latency, p95_latency, p99_latency) = {
            let samples = self.latency_samples.lock();
            if samples.is_empty() {
                (Duration::ZERO, Duration::ZERO, Duration::ZERO)
            } else {
                let mut sorted: Vec<Duration> = samples.iter().copied().collect();
                sorted.sort();

                let total: Duration = sorted.iter().sum();
                let average = total / sorted.len() as u32;

                (
                    average,
                    calculate_percentile(&sorted, 0.95),
                    calculate_percentile(&sorted, 0.99),
                )
            }
        };

        DeliveryMetrics {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            recoverable_failures: self.recoverable_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            average_latency,
            p95_latency,
            p99_latency,
        }
    }
}
