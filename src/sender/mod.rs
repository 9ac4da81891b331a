//! The delivery core: body encoding, request construction, rate limiting,
//! the network send and response classification.

pub mod client;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod log_sink;
pub mod metrics;
pub mod rate_limit;
pub mod request;
pub mod serialization;

pub use client::HttpClient;
pub use clock::{Clock, SystemClock};
pub use config::OutputConfig;
pub use dispatch::{Dispatcher, ResponseSummary, classify, summarize};
pub use log_sink::{LogSink, TracingSink};
pub use metrics::{DeliveryMetrics, MetricsCollector};
pub use rate_limit::RateLimiter;
pub use request::{Authentication, BasicAuth, HttpMethod, RequestBuilder, RequestDescriptor};
pub use serialization::{EncodedBody, SerializerKind};
