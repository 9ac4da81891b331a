//! Minimal host pipeline: reads NDJSON records, groups them into batches
//! and drives an [`Output`], re-delivering on recoverable failures.

use super::retry::RetryPolicy;
use crate::domain::{Batch, Payload, TimedRecord};
use crate::output::Output;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStats {
    pub lines_read: u64,
    pub malformed_lines: u64,
    pub records_delivered: u64,
    pub records_dropped: u64,
    pub retries: u64,
}

pub struct Host<O> {
    output: O,
    tag: String,
    batch_size: usize,
    retry: RetryPolicy,
}

impl<O: Output> Host<O> {
    pub fn new(output: O, tag: impl Into<String>, batch_size: usize, retry: RetryPolicy) -> Self {
        Self {
            output,
            tag: tag.into(),
            batch_size: batch_size.max(1),
            retry,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Reads until EOF, delivering every full batch and the final partial one.
    pub async fn run<R>(&self, reader: R) -> std::io::Result<HostStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = HostStats::default();
        let mut lines = reader.lines();
        let mut batch = Batch::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            stats.lines_read += 1;

            match parse_line(&line, chrono::Utc::now().timestamp()) {
                Ok((time, record)) => batch.push(time, record),
                Err(reason) => {
                    warn!("Skipping malformed line {}: {}", stats.lines_read, reason);
                    stats.malformed_lines += 1;
                    continue;
                }
            }

            if batch.len() >= self.batch_size {
                self.flush(std::mem::take(&mut batch), &mut stats).await;
            }
        }

        if !batch.is_empty() {
            self.flush(batch, &mut stats).await;
        }

        Ok(stats)
    }

    async fn flush(&self, batch: Batch, stats: &mut HostStats) {
        let count = batch.len() as u64;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let result = self
                .output
                .deliver(&self.tag, None, Payload::Batch(batch.clone()))
                .await;

            match result {
                Ok(()) => {
                    debug!("Delivered batch of {} records", count);
                    stats.records_delivered += count;
                    return;
                }
                Err(e) if e.is_recoverable() && self.retry.should_retry(attempts) => {
                    let delay = self.retry.delay_for(attempts - 1);
                    warn!(
                        "Recoverable failure (attempt {}), retrying in {:?}: {}",
                        attempts, delay, e
                    );
                    stats.retries += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("Dropping batch of {} records after {} attempts: {}", count, attempts, e);
                    stats.records_dropped += count;
                    return;
                }
            }
        }
    }
}

/// Parses one JSON object line. An integer `time` field becomes the record's
/// timestamp, otherwise `now` is used.
pub fn parse_line(line: &str, now: i64) -> Result<TimedRecord, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => {
            let time = record.get("time").and_then(Value::as_i64).unwrap_or(now);
            Ok((Some(time), record))
        }
        Ok(other) => Err(format!("expected a JSON object, got {}", json_type(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
