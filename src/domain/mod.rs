//! Domain layer for rask-http-output.
//!
//! Contains the canonical types shared across all modules:
//! - `Record` / `Batch` / `Payload`: what the host pipeline hands over
//! - `Outcome`: classified result of one send attempt
//! - `OutputError`: errors surfaced to the host
//! - `Secret`: credential wrapper that never prints its value

pub mod error;
pub mod outcome;
pub mod record;
pub mod secret;

pub use error::OutputError;
pub use outcome::{Outcome, OutcomeKind};
pub use record::{Batch, EventTime, Payload, Record, TimedRecord};
pub use secret::Secret;
