//! Data Logging
//!
//! Writes decoded samples to disk as they arrive and drives the polling loop
//! that feeds the framer.

mod error;
mod format;
mod recorder;
mod writer;

pub use error::DatalogError;
pub use format::{format_sample, parse_line, read_samples};
pub use recorder::{Recorder, RecorderConfig, SessionStats, START_GRACE};
pub use writer::SampleWriter;
