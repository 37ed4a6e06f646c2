use pretty_assertions::assert_eq;
use scibut_core::clock::{HostClock, ManualClock};
use scibut_core::protocol::{
    ByteSource, Framer, FramerOptions, MemorySource, Outcome, RejectReason, Sample,
};
use std::collections::VecDeque;
use std::io;

/// Mock serial port: bytes arrive in scripted bursts, one burst per
/// availability poll, optionally advancing a clock as they do.
struct ScriptedSource {
    buffered: VecDeque<u8>,
    arrivals: VecDeque<Vec<u8>>,
    clock: Option<(ManualClock, f64)>,
    short_reads: usize,
    polls: usize,
}

impl ScriptedSource {
    fn new(initial: &[u8]) -> Self {
        Self {
            buffered: initial.iter().copied().collect(),
            arrivals: VecDeque::new(),
            clock: None,
            short_reads: 0,
            polls: 0,
        }
    }

    fn then(mut self, burst: &[u8]) -> Self {
        self.arrivals.push_back(burst.to_vec());
        self
    }

    fn ticking(mut self, clock: ManualClock, per_poll: f64) -> Self {
        self.clock = Some((clock, per_poll));
        self
    }

    /// Make the next multi-byte read return at most three bytes
    fn short_read_once(mut self) -> Self {
        self.short_reads = 1;
        self
    }
}

impl ByteSource for ScriptedSource {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut n = n;
        if n > 1 && self.short_reads > 0 {
            self.short_reads -= 1;
            n = n.min(3);
        }
        let count = n.min(self.buffered.len());
        Ok(self.buffered.drain(..count).collect())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.polls += 1;
        if let Some((clock, step)) = &self.clock {
            clock.advance(*step);
        }
        if let Some(burst) = self.arrivals.pop_front() {
            self.buffered.extend(burst);
        }
        Ok(self.buffered.len())
    }
}

fn framer(start: f64) -> Framer<ManualClock> {
    Framer::new(ManualClock::new(start))
}

fn drain<S: ByteSource>(framer: &Framer<ManualClock>, source: &mut S, polls: usize) -> Vec<Outcome> {
    (0..polls)
        .map(|_| framer.process_once(&mut *source).unwrap())
        .collect()
}

#[test]
fn test_valid_packet_end_to_end() {
    let mut source = MemorySource::new(vec![b'B', 0x01, 0x00, 0x2C, 0x01, b'E']);
    let outcome = framer(5.0).process_once(&mut source).unwrap();

    assert_eq!(
        outcome,
        Outcome::Sample(Sample {
            device_timestamp_ms: 1,
            reading: 300,
            host_time_s: 5.0,
        })
    );
}

#[test]
fn test_bad_terminator_then_resync() {
    let mut source = MemorySource::new(vec![
        b'B', 0x01, 0x00, 0x2C, 0x01, b'X', // wrong terminator
        b'B', 0x02, 0x00, 0x03, 0x00, b'E',
    ]);
    let f = framer(0.0);

    let first = f.process_once(&mut source).unwrap();
    let rejected = first.rejected().expect("bad packet must be rejected");
    assert_eq!(rejected.reason, RejectReason::BadTerminator);
    assert_eq!(rejected.bytes, vec![0x01, 0x00, 0x2C, 0x01, b'X']);

    let second = f.process_once(&mut source).unwrap();
    let sample = second.sample().expect("next start marker must frame");
    assert_eq!(sample.device_timestamp_ms, 2);
    assert_eq!(sample.reading, 3);
}

#[test]
fn test_short_read_then_resync() {
    let mut source = ScriptedSource::new(&[b'B', 0x01, 0x00, 0x2C, 0x01, b'E'])
        .short_read_once()
        .then(&[])
        .then(&[]);
    source.buffered.extend([b'B', 0x09, 0x00, 0x0A, 0x00, b'E']);
    let f = framer(0.0);

    let first = f.process_once(&mut source).unwrap();
    let rejected = first.rejected().unwrap();
    assert_eq!(rejected.reason, RejectReason::ShortPacket);
    assert_eq!(rejected.bytes, vec![0x01, 0x00, 0x2C]);

    // The leftover 0x01 'E' are stray bytes until the next 'B'
    let rest = drain(&f, &mut source, 3);
    assert_eq!(rest[0].rejected().unwrap().reason, RejectReason::UnexpectedByte);
    assert_eq!(rest[1].rejected().unwrap().bytes, vec![b'E']);
    assert_eq!(rest[2].sample().unwrap().reading, 10);
}

#[test]
fn test_embedded_start_marker_not_rescanned() {
    let mut source = MemorySource::new(vec![
        b'B', b'B', 0x01, 0x00, 0x00, b'X', // bad packet hiding a 'B'
        0x01, 0x00, 0x00, 0x00, b'E',
    ]);
    let f = framer(0.0);
    let outcomes = drain(&f, &mut source, 6);

    assert_eq!(
        outcomes[0].rejected().unwrap().reason,
        RejectReason::BadTerminator
    );
    for outcome in &outcomes[1..] {
        assert_eq!(
            outcome.rejected().unwrap().reason,
            RejectReason::UnexpectedByte
        );
    }
    assert_eq!(source.remaining(), 0);
}

#[test]
fn test_newline_is_transparent() {
    let mut source = MemorySource::new(b"\n\n\nB\x00\x00\x00\x00E\n".to_vec());
    let f = framer(0.0);
    let outcomes = drain(&f, &mut source, 5);

    assert!(outcomes[..3].iter().all(Outcome::is_idle));
    assert!(outcomes[3].sample().is_some());
    assert!(outcomes[4].is_idle());
    assert!(outcomes.iter().all(|o| o.rejected().is_none()));
}

#[test]
fn test_idle_is_idempotent() {
    let mut source = ScriptedSource::new(&[]);
    let f = framer(0.0);

    for _ in 0..10 {
        assert_eq!(f.process_once(&mut source).unwrap(), Outcome::Idle);
    }
    assert_eq!(source.polls, 0);
}

#[test]
fn test_host_time_captured_at_start_marker() {
    let clock = ManualClock::new(10.0);
    let mut source = ScriptedSource::new(&[b'B'])
        .ticking(clock.clone(), 0.5)
        .then(&[])
        .then(&[0x10, 0x00])
        .then(&[0x20, 0x00, b'E']);
    let f = Framer::new(clock.clone());

    let outcome = f.process_once(&mut source).unwrap();
    let sample = outcome.sample().unwrap();

    assert_eq!(sample.host_time_s, 10.0);
    assert_eq!(sample.device_timestamp_ms, 0x10);
    assert_eq!(sample.reading, 0x20);
    assert_eq!(source.polls, 3);
    assert!(clock.now_secs() > sample.host_time_s);
}

#[test]
fn test_packet_timeout_rejects_partial_packet() {
    let mut source = ScriptedSource::new(&[b'B', 0x01, 0x00]);
    let options = FramerOptions {
        packet_timeout_ms: Some(20),
        poll_backoff_us: Some(1_000),
    };
    let f = Framer::with_options(ManualClock::new(0.0), options);

    let outcome = f.process_once(&mut source).unwrap();
    let rejected = outcome.rejected().unwrap();
    assert_eq!(rejected.reason, RejectReason::PacketTimeout);
    assert_eq!(rejected.bytes, vec![0x01, 0x00]);
    assert!(source.polls > 1);

    source.buffered.extend([b'B', 0x05, 0x00, 0x06, 0x00, b'E']);
    let next = f.process_once(&mut source).unwrap();
    assert_eq!(next.sample().unwrap().device_timestamp_ms, 5);
}

#[test]
fn test_field_decoding_covers_every_byte() {
    let mut bytes = Vec::new();
    for lo in 0..=255u8 {
        let hi = lo ^ 0xA5;
        bytes.extend([b'B', lo, hi, hi, lo, b'E', b'\n']);
    }
    let mut source = MemorySource::new(bytes);
    let f = framer(0.0);

    for lo in 0..=255u8 {
        let hi = lo ^ 0xA5;
        let outcome = f.process_once(&mut source).unwrap();
        let sample = outcome.sample().unwrap();
        assert_eq!(sample.device_timestamp_ms, lo as u16 + 256 * hi as u16);
        assert_eq!(sample.reading, hi as u16 + 256 * lo as u16);
        assert!(f.process_once(&mut source).unwrap().is_idle());
    }
}
