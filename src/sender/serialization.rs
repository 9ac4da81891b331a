//! Request body encodings.
//!
//! `form` and `json` encode one record, `ndjson` encodes a whole batch with
//! one JSON object per line. The JSON encodings add an RFC3339 `time` field
//! when the record has none and the supplied timestamp is an integer.

use crate::domain::{Batch, EventTime, OutputError, Payload, Record};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

const TIME_KEY: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializerKind {
    #[default]
    Form,
    Json,
    /// Newline-delimited JSON. Only reachable through bulk mode.
    Ndjson,
}

impl SerializerKind {
    /// Resolves a configured serializer name. Anything other than `json` or
    /// `form` falls back to form encoding.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Form,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Form => FORM_CONTENT_TYPE,
            Self::Json => JSON_CONTENT_TYPE,
            Self::Ndjson => NDJSON_CONTENT_TYPE,
        }
    }
}

impl<'de> Deserialize<'de> for SerializerKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Serialized request body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Encodes a payload with the given serializer kind.
///
/// A batch can only be expressed as NDJSON, so batches always take the bulk
/// encoding regardless of `kind`.
pub fn encode(kind: SerializerKind, time: EventTime, payload: Payload) -> Result<EncodedBody, OutputError> {
    match (kind, payload) {
        (SerializerKind::Ndjson, payload) => serialize_ndjson(payload.into_batch(time)),
        (_, Payload::Batch(batch)) => serialize_ndjson(batch),
        (SerializerKind::Json, Payload::Record(record)) => serialize_json(record, time),
        (SerializerKind::Form, Payload::Record(record)) => Ok(serialize_form(&record)),
    }
}

/// `application/x-www-form-urlencoded` pairs, no time injection.
pub fn serialize_form(record: &Record) -> EncodedBody {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in record {
        form.append_pair(key, &form_value(value));
    }

    EncodedBody {
        bytes: Bytes::from(form.finish()),
        content_type: FORM_CONTENT_TYPE,
    }
}

pub fn serialize_json(mut record: Record, time: EventTime) -> Result<EncodedBody, OutputError> {
    inject_time(&mut record, time);
    let bytes = serde_json::to_vec(&record)?;

    Ok(EncodedBody {
        bytes: Bytes::from(bytes),
        content_type: JSON_CONTENT_TYPE,
    })
}

/// One JSON object per record joined by `\n`. An empty batch yields an
/// empty body.
pub fn serialize_ndjson(batch: Batch) -> Result<EncodedBody, OutputError> {
    let mut buffer = Vec::with_capacity(batch.len().saturating_mul(256));

    for (index, (time, mut record)) in batch.into_iter().enumerate() {
        if index > 0 {
            buffer.push(b'\n');
        }
        inject_time(&mut record, time);
        serde_json::to_writer(&mut buffer, &record)?;
    }

    Ok(EncodedBody {
        bytes: Bytes::from(buffer),
        content_type: NDJSON_CONTENT_TYPE,
    })
}

/// Adds `time` as an RFC3339 UTC string when the record has no usable
/// `time` value and `time` is an integer timestamp.
pub fn inject_time(record: &mut Record, time: EventTime) {
    let has_time = record.get(TIME_KEY).is_some_and(|value| !value.is_null());
    if has_time {
        return;
    }

    if let Some(formatted) = time.and_then(rfc3339_from_unix) {
        record.insert(TIME_KEY.to_string(), Value::String(formatted));
    }
}

/// `1700000000` -> `"2023-11-14T22:13:20+00:00"`. `None` when out of range.
pub fn rfc3339_from_unix(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Secs, false))
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
