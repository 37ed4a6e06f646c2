//! Data recorder
//!
//! Polls the framer until the recording window closes, writing samples to
//! the sink and reporting rejected bytes through `tracing`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{format_sample, DatalogError, SampleWriter};
use crate::clock::HostClock;
use crate::protocol::{ByteSource, Framer, Outcome, RejectReason, RejectedPacket};

/// Extra time added to the requested duration before the window closes
pub const START_GRACE: Duration = Duration::from_secs(1);

/// Recording window and console behaviour
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// How long to record; `None` records until cancelled
    pub duration: Option<Duration>,
    /// Added to `duration` to cover device start-up
    pub grace: Duration,
    /// Print each sample line to stdout as well
    pub echo: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            duration: None,
            grace: START_GRACE,
            echo: true,
        }
    }
}

/// Counters for one recording session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Samples written
    pub samples: u64,
    /// Packets cut short by the transport
    pub short_packets: u64,
    /// Packets without the end marker
    pub bad_terminators: u64,
    /// Stray bytes seen while scanning
    pub unexpected_bytes: u64,
    /// Packets abandoned after the packet timeout
    pub packet_timeouts: u64,
    /// Polls that produced nothing
    pub idle_ticks: u64,
    /// Wall time spent recording
    pub elapsed: Duration,
}

impl SessionStats {
    /// Count one framer outcome
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Sample(_) => self.samples += 1,
            Outcome::Idle => self.idle_ticks += 1,
            Outcome::Rejected(rejected) => match rejected.reason {
                RejectReason::ShortPacket => self.short_packets += 1,
                RejectReason::BadTerminator => self.bad_terminators += 1,
                RejectReason::UnexpectedByte => self.unexpected_bytes += 1,
                RejectReason::PacketTimeout => self.packet_timeouts += 1,
            },
        }
    }

    /// Packets rejected after a start marker
    pub fn rejected_packets(&self) -> u64 {
        self.short_packets + self.bad_terminators + self.packet_timeouts
    }

    /// Everything rejected, stray bytes included
    pub fn rejected(&self) -> u64 {
        self.rejected_packets() + self.unexpected_bytes
    }
}

/// Drives a [`Framer`] against a byte source for a bounded or open-ended run
pub struct Recorder<C> {
    framer: Framer<C>,
    config: RecorderConfig,
    cancel: Arc<AtomicBool>,
}

impl<C: HostClock> Recorder<C> {
    /// Create a recorder around `framer`
    pub fn new(framer: Framer<C>, config: RecorderConfig) -> Self {
        Self {
            framer,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the loop once set.
    ///
    /// Checked between packets only; a packet wait in progress is not
    /// interrupted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Record until the window closes, the run is cancelled, or a finite
    /// source runs dry.
    pub fn run<S, W>(
        &self,
        source: &mut S,
        writer: &mut SampleWriter<W>,
    ) -> Result<SessionStats, DatalogError>
    where
        S: ByteSource + ?Sized,
        W: Write,
    {
        let started = Instant::now();
        // A window too long to represent never closes
        let deadline = self.config.duration.and_then(|duration| {
            started.checked_add(self.config.grace.saturating_add(duration))
        });
        let mut stats = SessionStats::default();

        info!(duration = ?self.config.duration, "recording started");

        loop {
            let outcome = self.framer.process_once(source)?;
            stats.record(&outcome);

            match outcome {
                Outcome::Sample(sample) => {
                    writer.write_sample(&sample)?;
                    if self.config.echo {
                        print!("{}", format_sample(&sample));
                    }
                }
                Outcome::Rejected(rejected) => log_rejection(&rejected),
                Outcome::Idle => {
                    if source.end_of_input() && source.bytes_available()? == 0 {
                        debug!("source exhausted");
                        break;
                    }
                }
            }

            if self.cancel.load(Ordering::SeqCst) {
                info!("recording cancelled");
                break;
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
        }

        stats.elapsed = started.elapsed();
        info!(
            samples = stats.samples,
            rejected_packets = stats.rejected_packets(),
            unexpected_bytes = stats.unexpected_bytes,
            elapsed = ?stats.elapsed,
            "recording finished"
        );

        Ok(stats)
    }
}

fn log_rejection(rejected: &RejectedPacket) {
    if rejected.reason.entered_packet() {
        if rejected.bytes.is_empty() {
            debug!(reason = %rejected.reason, "rejected empty packet");
        } else {
            warn!(reason = %rejected.reason, bytes = %rejected.hex(), "rejected packet");
        }
    } else {
        warn!(byte = %rejected.hex(), "rejected non-start byte");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::protocol::{MemorySource, Sample};

    #[test]
    fn test_stats_counting() {
        let mut stats = SessionStats::default();
        stats.record(&Outcome::Idle);
        stats.record(&Outcome::Sample(Sample {
            device_timestamp_ms: 0,
            reading: 0,
            host_time_s: 0.0,
        }));
        stats.record(&Outcome::Rejected(RejectedPacket::new(
            RejectReason::BadTerminator,
            vec![0; 5],
        )));
        stats.record(&Outcome::Rejected(RejectedPacket::new(
            RejectReason::UnexpectedByte,
            vec![b'x'],
        )));

        assert_eq!(stats.idle_ticks, 1);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.rejected_packets(), 1);
        assert_eq!(stats.rejected(), 2);
    }

    #[test]
    fn test_run_stops_at_end_of_replay() {
        let recorder = Recorder::new(
            Framer::new(ManualClock::new(0.0)),
            RecorderConfig {
                echo: false,
                ..Default::default()
            },
        );
        let mut source = MemorySource::new(b"B\x01\x00\x2c\x01E\n".to_vec());
        let mut writer = SampleWriter::new(Vec::new());

        let stats = recorder.run(&mut source, &mut writer).unwrap();
        assert_eq!(stats.samples, 1);
        assert_eq!(writer.written(), 1);
    }

    #[test]
    fn test_unrepresentable_duration_never_closes() {
        let recorder = Recorder::new(
            Framer::new(ManualClock::new(0.0)),
            RecorderConfig {
                duration: Some(Duration::MAX),
                echo: false,
                ..Default::default()
            },
        );
        let mut source = MemorySource::new(b"B\x01\x00\x2c\x01E\n".to_vec());
        let mut writer = SampleWriter::new(Vec::new());

        let stats = recorder.run(&mut source, &mut writer).unwrap();
        assert_eq!(stats.samples, 1);
    }
}
