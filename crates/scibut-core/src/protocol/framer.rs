//! Packet framer
//!
//! Turns the raw byte stream into samples one poll at a time. Each call to
//! [`Framer::process_once`] starts scanning for a start marker and returns to
//! scanning before it exits, so no framing state survives between calls.
//!
//! A rejected packet is never re-scanned for an embedded start marker; the
//! next 'B' pulled from the stream restores framing.

use serde::{Deserialize, Serialize};
use std::hint;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::{
    ByteSource, Packet, ProtocolError, RejectReason, RejectedPacket, Sample, NEWLINE,
    PACKET_LENGTH, START_MARKER,
};
use crate::clock::HostClock;

/// Result of one framer poll
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A valid packet was decoded
    Sample(Sample),
    /// Bytes were discarded
    Rejected(RejectedPacket),
    /// Nothing arrived, or only a newline
    Idle,
}

impl Outcome {
    /// Nothing to record this poll
    pub fn is_idle(&self) -> bool {
        matches!(self, Outcome::Idle)
    }

    /// The decoded sample, if any
    pub fn sample(&self) -> Option<&Sample> {
        match self {
            Outcome::Sample(sample) => Some(sample),
            _ => None,
        }
    }

    /// The rejected bytes, if any
    pub fn rejected(&self) -> Option<&RejectedPacket> {
        match self {
            Outcome::Rejected(rejected) => Some(rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    ScanningForStart,
    ReadingPacket,
}

/// Tuning for the wait between a start marker and the rest of its packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramerOptions {
    /// Give up on a started packet after this many milliseconds.
    ///
    /// `None` waits forever: a link that dies mid-packet hangs the framer.
    pub packet_timeout_ms: Option<u64>,

    /// Sleep between availability checks, in microseconds.
    ///
    /// `None` spins, which adds the least latency but keeps a core busy.
    pub poll_backoff_us: Option<u64>,
}

impl FramerOptions {
    /// Packet wait limit as a duration
    pub fn packet_timeout(&self) -> Option<Duration> {
        self.packet_timeout_ms.map(Duration::from_millis)
    }

    /// Pause between availability checks as a duration
    pub fn poll_backoff(&self) -> Option<Duration> {
        self.poll_backoff_us.map(Duration::from_micros)
    }
}

enum Wait {
    Ready,
    TimedOut,
}

/// Start/end-marker framer for the sensor stream
pub struct Framer<C> {
    options: FramerOptions,
    clock: C,
}

impl<C: HostClock> Framer<C> {
    /// Create a framer with default options (unbounded wait, tight polling)
    pub fn new(clock: C) -> Self {
        Self::with_options(clock, FramerOptions::default())
    }

    /// Create a framer with explicit wait tuning
    pub fn with_options(clock: C, options: FramerOptions) -> Self {
        Self { options, clock }
    }

    /// Pull one byte from `source` and act on it.
    ///
    /// On a start marker this blocks until a full packet is buffered (or the
    /// packet timeout, if configured, expires). Only transport failures are
    /// returned as errors.
    pub fn process_once<S>(&self, source: &mut S) -> Result<Outcome, ProtocolError>
    where
        S: ByteSource + ?Sized,
    {
        let first = source.read(1)?;
        let Some(&byte) = first.first() else {
            return Ok(Outcome::Idle);
        };

        match byte {
            START_MARKER => self.read_packet(source),
            NEWLINE => Ok(Outcome::Idle),
            other => Ok(Outcome::Rejected(RejectedPacket::new(
                RejectReason::UnexpectedByte,
                vec![other],
            ))),
        }
    }

    fn read_packet<S>(&self, source: &mut S) -> Result<Outcome, ProtocolError>
    where
        S: ByteSource + ?Sized,
    {
        // Stamp before waiting: the wait can be arbitrarily long
        let host_time_s = self.clock.now_secs();
        trace!(
            from = ?FramerState::ScanningForStart,
            to = ?FramerState::ReadingPacket,
            host_time_s,
            "start marker"
        );

        let outcome = match self.wait_for_packet(source)? {
            Wait::Ready => {
                let bytes = source.read(PACKET_LENGTH)?;
                match Packet::from_bytes(&bytes) {
                    Ok(packet) => Outcome::Sample(packet.into_sample(host_time_s)),
                    Err(reason) => Outcome::Rejected(RejectedPacket::new(reason, bytes)),
                }
            }
            Wait::TimedOut => {
                let pending = source.bytes_available()?.min(PACKET_LENGTH);
                let bytes = source.read(pending)?;
                Outcome::Rejected(RejectedPacket::new(RejectReason::PacketTimeout, bytes))
            }
        };

        trace!(
            from = ?FramerState::ReadingPacket,
            to = ?FramerState::ScanningForStart,
            "packet done"
        );
        Ok(outcome)
    }

    fn wait_for_packet<S>(&self, source: &mut S) -> Result<Wait, ProtocolError>
    where
        S: ByteSource + ?Sized,
    {
        let timeout = self.options.packet_timeout();
        let backoff = self.options.poll_backoff();
        let started = Instant::now();

        loop {
            let available = source.bytes_available()?;
            if available >= PACKET_LENGTH || source.end_of_input() {
                return Ok(Wait::Ready);
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    debug!(available, ?limit, "gave up waiting for packet");
                    return Ok(Wait::TimedOut);
                }
            }

            match backoff {
                Some(pause) => thread::sleep(pause),
                None => hint::spin_loop(),
            }
        }
    }
}
