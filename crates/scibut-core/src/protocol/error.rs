//! Protocol errors

use thiserror::Error;

/// Errors that end a recording session.
///
/// Packet-level problems are not errors; they come back as
/// [`Outcome::Rejected`](super::Outcome::Rejected) with a [`RejectReason`].
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The serial port could not be opened
    #[error("Cannot open serial port {port}: {reason}")]
    TransportUnavailable {
        /// Port name as given
        port: String,
        /// Driver error text
        reason: String,
    },

    /// The port opened but could not be configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Read failure on an open transport
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a byte sequence was discarded instead of decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Fewer than a full packet came back after a start marker
    ShortPacket,
    /// A full packet was read but its last byte is not the end marker
    BadTerminator,
    /// A byte other than the start marker or a newline while scanning
    UnexpectedByte,
    /// The rest of a started packet did not arrive within the packet timeout
    PacketTimeout,
}

impl RejectReason {
    /// Diagnostic category used in log output
    pub fn category(&self) -> &'static str {
        match self {
            RejectReason::ShortPacket => "short packet",
            RejectReason::BadTerminator => "bad terminator",
            RejectReason::UnexpectedByte => "non-start byte",
            RejectReason::PacketTimeout => "packet timeout",
        }
    }

    /// Whether the rejection happened after a start marker was seen
    pub fn entered_packet(&self) -> bool {
        !matches!(self, RejectReason::UnexpectedByte)
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.category())
    }
}
