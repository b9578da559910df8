//! Logging and Signal Recording Module
//!
//! Backends for recording live trade actions:
//! - `SignalRecorder` trait - Pluggable recorder interface
//! - `CsvRecorder` - Append-only CSV file
//! - `TracingRecorder` - Structured log events
//! - `MultiRecorder` - Fan-out to several backends

pub mod csv_recorder;
pub mod recorder;
pub mod tracing_recorder;

pub use csv_recorder::CsvRecorder;
pub use recorder::{MultiRecorder, RecordError, SignalRecord, SignalRecorder};
pub use tracing_recorder::TracingRecorder;
