#![allow(dead_code)]

use parking_lot::Mutex;
use rask_http_output::domain::Record;
use rask_http_output::sender::{Clock, LogSink};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Clock advanced by hand. Unix time is fixed unless set.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
    unix: Mutex<i64>,
}

impl ManualClock {
    pub fn new(unix: i64) -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            unix: Mutex::new(unix),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn set_unix(&self, unix: i64) {
        *self.unix.lock() = unix;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn unix_seconds(&self) -> i64 {
        *self.unix.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// Captures every message the send path reports.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.by_level(Level::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.by_level(Level::Info)
    }

    fn by_level(&self, level: Level) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.messages.lock().push((Level::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().push((Level::Warn, message.to_string()));
    }
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
