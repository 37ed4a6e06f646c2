//! Data logging errors

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Errors raised while recording or reading sample logs
#[derive(Error, Debug)]
pub enum DatalogError {
    /// Transport failure while reading the sensor
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Sample log could not be written or read
    #[error("Failed to write sample log: {0}")]
    Io(#[from] std::io::Error),

    /// A log line does not hold a sample
    #[error("Malformed sample line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}
