#[cfg(test)]
use mockall::automock;

/// Destination for the operator-facing messages of the send path.
#[cfg_attr(test, automock)]
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the global `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "rask_http_output::sender", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "rask_http_output::sender", "{}", message);
    }
}
