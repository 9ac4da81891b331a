//! Network send and response classification.

use super::client::{HttpClient, error_kind};
use super::clock::Clock;
use super::config::OutputConfig;
use super::log_sink::LogSink;
use super::metrics::{DeliveryMetrics, MetricsCollector};
use super::rate_limit::RateLimiter;
use super::request::RequestDescriptor;
use crate::domain::{Outcome, OutputError};
use reqwest::Response;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Status line and body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl ResponseSummary {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Reads the body. A failed body read is a transport failure.
    pub async fn read(response: Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;
        Ok(Self::new(status.as_u16(), reason, body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `"<code> <reason> <body>"`, or `"res=nil"` without a response.
pub fn summarize(response: Option<&ResponseSummary>) -> String {
    match response {
        Some(r) => format!("{} {} {}", r.status, r.reason, r.body),
        None => "res=nil".to_string(),
    }
}

/// Ordered check: 2xx, then the recoverable set, then everything else.
pub fn classify(response: Option<&ResponseSummary>, recoverable: &BTreeSet<u16>) -> Outcome {
    match response {
        Some(r) if r.is_success() => Outcome::Success,
        Some(r) if recoverable.contains(&r.status) => Outcome::RecoverableFailure(summarize(Some(r))),
        other => Outcome::Rejected(summarize(other)),
    }
}

pub struct Dispatcher {
    client: HttpClient,
    limiter: RateLimiter,
    recoverable_status_codes: BTreeSet<u16>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn LogSink>,
    metrics: MetricsCollector,
}

impl Dispatcher {
    pub fn new(
        config: &OutputConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, OutputError> {
        let client = HttpClient::new(config)?;
        if !client.verifies_tls() {
            sink.warn(&format!(
                "TLS peer verification disabled for {}",
                config.endpoint_url
            ));
        }

        Ok(Self {
            client,
            limiter: RateLimiter::new(config.rate_limit()),
            recoverable_status_codes: config.recoverable_status_codes.clone(),
            clock,
            sink,
            metrics: MetricsCollector::new(),
        })
    }

    pub fn metrics(&self) -> DeliveryMetrics {
        self.metrics.snapshot()
    }

    /// Sends one request and classifies what happened. Never blocks or
    /// errors on rate limiting; the attempt is dropped instead.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Outcome {
        if !self.limiter.try_acquire(self.clock.now()) {
            self.sink.info("Dropped request due to rate limiting");
            let outcome = Outcome::Skipped;
            self.metrics.record_outcome(&outcome, 0, std::time::Duration::ZERO);
            return outcome;
        }

        let method = descriptor.method;
        let url = descriptor.url.to_string();
        let bytes = descriptor.body.len();
        let start = Instant::now();

        let outcome = match self.client.execute(descriptor).await {
            Ok(response) if response.status().is_success() => {
                debug!("{} {} -> {}", method, url, response.status());
                Outcome::Success
            }
            Ok(response) => match ResponseSummary::read(response).await {
                Ok(summary) => classify(Some(&summary), &self.recoverable_status_codes),
                Err(source) => self.transport_failure(method.as_str(), &url, source),
            },
            Err(source) => self.transport_failure(method.as_str(), &url, source),
        };

        if let Outcome::Rejected(summary) = &outcome {
            self.sink
                .warn(&format!("failed to {method} {url} ({summary})"));
        }

        let latency = start.elapsed();
        debug!("{} {} finished as {:?} in {:?}", method, url, outcome.kind(), latency);
        self.metrics.record_outcome(&outcome, bytes, latency);
        outcome
    }

    fn transport_failure(&self, method: &'static str, url: &str, source: reqwest::Error) -> Outcome {
        let kind = error_kind(&source);
        self.sink.warn(&format!(
            "HTTP {method} {url} raised {kind} error: '{source}'"
        ));

        Outcome::FatalFailure(OutputError::Transport {
            method,
            url: url.to_string(),
            kind,
            source,
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("client", &self.client)
            .field("limiter", &self.limiter)
            .field("recoverable_status_codes", &self.recoverable_status_codes)
            .finish()
    }
}
