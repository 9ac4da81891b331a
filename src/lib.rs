#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Batch sizes and latencies stay well within bounds
    clippy::cast_possible_wrap,       // Unix seconds fit in i64
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. OutputConfig in the sender module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod domain;
pub mod output;
pub mod sender;

// Re-export main types for easy access
pub use app::{App, Config};
pub use domain::{Batch, EventTime, Outcome, OutputError, Payload, Record};
pub use output::{HttpOutput, Output};
pub use sender::OutputConfig;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
