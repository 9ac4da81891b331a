use serde_json::{Map, Value};

/// One event as handed over by the host pipeline. Key order is preserved.
pub type Record = Map<String, Value>;

/// Integer Unix timestamp in seconds. `None` when the host has no integer
/// time for the record; no `time` field is injected in that case.
pub type EventTime = Option<i64>;

pub type TimedRecord = (EventTime, Record);

/// Ordered sequence of timestamped records, used in bulk mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    entries: Vec<TimedRecord>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: EventTime, record: Record) {
        self.entries.push((time, record));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedRecord> {
        self.entries.iter()
    }
}

impl From<Vec<TimedRecord>> for Batch {
    fn from(entries: Vec<TimedRecord>) -> Self {
        Self { entries }
    }
}

impl FromIterator<TimedRecord> for Batch {
    fn from_iter<I: IntoIterator<Item = TimedRecord>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Batch {
    type Item = TimedRecord;
    type IntoIter = std::vec::IntoIter<TimedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// What a single `deliver` call carries: one record or a whole batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(Record),
    Batch(Batch),
}

impl Payload {
    /// Number of records carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Record(_) => 1,
            Self::Batch(batch) => batch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Views the payload as a batch, pairing a lone record with `time`.
    pub fn into_batch(self, time: EventTime) -> Batch {
        match self {
            Self::Record(record) => Batch::from(vec![(time, record)]),
            Self::Batch(batch) => batch,
        }
    }
}

impl From<Record> for Payload {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<Batch> for Payload {
    fn from(batch: Batch) -> Self {
        Self::Batch(batch)
    }
}
