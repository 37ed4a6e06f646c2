//! Serial Protocol
//!
//! Implements the SciBut sensor wire format: a start marker followed by a
//! fixed five byte packet carrying a 16-bit device clock and a 16-bit reading.
//!
//! ```text
//! 'B' | ts_lo ts_hi | rd_lo rd_hi | 'E'
//! ```
//!
//! There is no checksum; integrity is judged by the end marker alone.

mod error;
mod framer;
mod packet;
pub mod serial;
pub mod stream;

pub use error::{ProtocolError, RejectReason};
pub use framer::{Framer, FramerOptions, Outcome};
pub use packet::{Packet, RejectedPacket, Sample};
pub use serial::{list_ports, open_port, PortInfo};
pub use stream::{ByteSource, MemorySource, SerialSource};

/// Byte that opens a packet ('B')
pub const START_MARKER: u8 = 0x42;

/// Byte that must close a valid packet ('E')
pub const END_MARKER: u8 = 0x45;

/// Line feed the firmware emits between packets; ignored while scanning
pub const NEWLINE: u8 = 0x0A;

/// Bytes following the start marker, end marker included
pub const PACKET_LENGTH: usize = 5;

/// Default baud rate of the sensor firmware
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default read timeout for a single poll in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 250;
