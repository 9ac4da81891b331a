use super::request::{Authentication, HttpMethod};
use super::serialization::SerializerKind;
use crate::domain::Secret;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

pub const DEFAULT_RECOVERABLE_STATUS: u16 = 503;

/// Resolved, read-only settings of one HTTP output instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target URL. May contain `${tag}` and `${time}` placeholders.
    pub endpoint_url: String,
    /// Skip TLS peer verification. Opt-in only.
    pub ssl_no_verify: bool,
    pub http_method: HttpMethod,
    pub serializer: SerializerKind,
    /// Minimum gap between attempted sends, 0 disables the limiter.
    pub rate_limit_msec: u64,
    /// Propagate transport failures to the caller.
    pub raise_on_error: bool,
    pub recoverable_status_codes: BTreeSet<u16>,
    /// JSON object mapping header name to value.
    pub custom_headers: String,
    pub authentication: Authentication,
    pub username: String,
    pub password: Secret,
    /// Send each `deliver` call as one NDJSON request.
    pub bulk_request: bool,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            ssl_no_verify: false,
            http_method: HttpMethod::Post,
            serializer: SerializerKind::Form,
            rate_limit_msec: 0,
            raise_on_error: true,
            recoverable_status_codes: BTreeSet::from([DEFAULT_RECOVERABLE_STATUS]),
            custom_headers: "{}".to_string(),
            authentication: Authentication::None,
            username: String::new(),
            password: Secret::default(),
            bulk_request: false,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("rask-http-output/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl OutputConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    /// Bulk mode forces NDJSON whatever serializer is configured.
    pub fn effective_serializer(&self) -> SerializerKind {
        if self.bulk_request {
            SerializerKind::Ndjson
        } else {
            self.serializer
        }
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_msec)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
