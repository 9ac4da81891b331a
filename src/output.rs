//! The HTTP output adapter: the entry point the host pipeline calls.
//!
//! In bulk mode every `deliver` call becomes one NDJSON request. Otherwise
//! each record gets its own build and send cycle, in order, each subject to
//! its own rate-limit check.

use crate::domain::{Batch, EventTime, Outcome, OutputError, Payload, Record};
use crate::sender::{
    Clock, DeliveryMetrics, Dispatcher, LogSink, OutputConfig, RequestBuilder, SystemClock,
    TracingSink,
};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Capability a host pipeline needs from an output.
///
/// `Err` means the payload was not delivered and the host decides what to
/// do; [`OutputError::is_recoverable`] marks errors worth re-delivering.
pub trait Output: Send + Sync {
    fn deliver(
        &self,
        tag: &str,
        time: EventTime,
        payload: Payload,
    ) -> impl Future<Output = Result<(), OutputError>> + Send;
}

pub struct HttpOutput {
    config: OutputConfig,
    builder: RequestBuilder,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
}

impl HttpOutput {
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        Self::with_capabilities(config, Arc::new(SystemClock), Arc::new(TracingSink))
    }

    /// Builds an output with an explicit clock and log sink.
    pub fn with_capabilities(
        config: OutputConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, OutputError> {
        let builder = RequestBuilder::new(&config)?;
        let dispatcher = Dispatcher::new(&config, Arc::clone(&clock), sink)?;

        Ok(Self {
            config,
            builder,
            dispatcher,
            clock,
        })
    }

    pub fn metrics(&self) -> DeliveryMetrics {
        self.dispatcher.metrics()
    }

    pub async fn deliver(
        &self,
        tag: &str,
        time: EventTime,
        payload: Payload,
    ) -> Result<(), OutputError> {
        if self.config.bulk_request {
            let batch = payload.into_batch(time);
            return self.handle_batch(tag, batch).await;
        }

        match payload {
            Payload::Record(record) => self.handle_record(tag, time, record).await,
            Payload::Batch(batch) => {
                for (record_time, record) in batch {
                    self.handle_record(tag, record_time, record).await?;
                }
                Ok(())
            }
        }
    }

    async fn handle_record(
        &self,
        tag: &str,
        time: EventTime,
        record: Record,
    ) -> Result<(), OutputError> {
        let request = self.builder.build(tag, time, Payload::Record(record))?;
        let outcome = self.dispatcher.send(request).await;
        self.surface(outcome)
    }

    /// One request for the whole batch, stamped with the current time.
    async fn handle_batch(&self, tag: &str, batch: Batch) -> Result<(), OutputError> {
        let batch_time = Some(self.clock.unix_seconds());
        debug!("Sending bulk request with {} records for tag {}", batch.len(), tag);

        let request = self.builder.build(tag, batch_time, Payload::Batch(batch))?;
        let outcome = self.dispatcher.send(request).await;
        self.surface(outcome)
    }

    /// Recoverable failures always propagate; transport failures only when
    /// `raise_on_error` is set. Everything else is already logged.
    fn surface(&self, outcome: Outcome) -> Result<(), OutputError> {
        match outcome {
            Outcome::Success | Outcome::Skipped | Outcome::Rejected(_) => Ok(()),
            Outcome::RecoverableFailure(summary) => Err(OutputError::Recoverable(summary)),
            Outcome::FatalFailure(error) if self.config.raise_on_error => Err(error),
            Outcome::FatalFailure(_) => Ok(()),
        }
    }
}

impl std::fmt::Debug for HttpOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOutput")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Output for HttpOutput {
    async fn deliver(
        &self,
        tag: &str,
        time: EventTime,
        payload: Payload,
    ) -> Result<(), OutputError> {
        HttpOutput::deliver(self, tag, time, payload).await
    }
}
