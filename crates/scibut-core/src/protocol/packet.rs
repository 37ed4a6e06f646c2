//! Packet decoding
//!
//! Packet format (bytes after the start marker):
//! - 2 bytes: device clock in milliseconds (little-endian)
//! - 2 bytes: sensor reading (little-endian)
//! - 1 byte: end marker 'E'

use byteorder::{ByteOrder, LittleEndian};
use super::{RejectReason, END_MARKER, PACKET_LENGTH};

/// A complete packet whose end marker has been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    raw: [u8; PACKET_LENGTH],
}

impl Packet {
    /// Validate raw packet bytes.
    ///
    /// Returns the reason the bytes cannot form a packet: `ShortPacket` when
    /// fewer than [`PACKET_LENGTH`] bytes are given, `BadTerminator` when the
    /// last byte is not [`END_MARKER`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, RejectReason> {
        let raw: [u8; PACKET_LENGTH] = data
            .try_into()
            .map_err(|_| RejectReason::ShortPacket)?;

        if raw[PACKET_LENGTH - 1] != END_MARKER {
            return Err(RejectReason::BadTerminator);
        }

        Ok(Self { raw })
    }

    /// Device clock in milliseconds (wraps every ~65 s)
    pub fn device_timestamp_ms(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[0..2])
    }

    /// Raw sensor reading
    pub fn reading(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[2..4])
    }

    /// Build a sample stamped with the host time of the start marker
    pub fn into_sample(self, host_time_s: f64) -> Sample {
        Sample {
            device_timestamp_ms: self.device_timestamp_ms(),
            reading: self.reading(),
            host_time_s,
        }
    }
}

/// A decoded, timestamped sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Device clock at transmission (ms)
    pub device_timestamp_ms: u16,
    /// Sensor reading
    pub reading: u16,
    /// Host clock when the start marker was seen (s)
    pub host_time_s: f64,
}

/// Bytes discarded by the framer, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPacket {
    /// Why the bytes were discarded
    pub reason: RejectReason,
    /// The bytes as read from the source
    pub bytes: Vec<u8>,
}

impl RejectedPacket {
    /// Create a new rejection record
    pub fn new(reason: RejectReason, bytes: Vec<u8>) -> Self {
        Self { reason, bytes }
    }

    /// Hex dump of the rejected bytes, e.g. `01 00 2c 01 58`
    pub fn hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
