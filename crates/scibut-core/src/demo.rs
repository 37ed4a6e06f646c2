//! Demo Mode - Simulated sensor for testing without hardware
//!
//! Emits the same byte stream as the photodiode firmware: one
//! `'B' ts ts rd rd 'E' '\n'` frame every few milliseconds, paced by the host
//! clock. Readings follow a slow sine wave around mid-scale with random noise,
//! clamped to the 10-bit ADC range.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crate::protocol::{ByteSource, END_MARKER, NEWLINE, START_MARKER};

/// Highest value the simulated 10-bit ADC produces
const ADC_MAX: f64 = 1023.0;

/// Bytes per simulated frame, trailing newline included
pub const FRAME_LENGTH: usize = 7;

/// Shape of the simulated signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Milliseconds between frames
    pub interval_ms: u64,
    /// Centre of the signal
    pub baseline: f64,
    /// Peak deviation from the baseline
    pub amplitude: f64,
    /// Sine period in seconds
    pub period_s: f64,
    /// Uniform noise added to each reading (+/-)
    pub noise: f64,
    /// Fraction of frames sent with a corrupted end marker
    pub corruption_rate: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5,
            baseline: 512.0,
            amplitude: 300.0,
            period_s: 4.0,
            noise: 8.0,
            corruption_rate: 0.0,
        }
    }
}

/// Simulated sensor implementing [`ByteSource`]
pub struct SimulatedDevice {
    config: DemoConfig,
    rng: StdRng,
    buffer: VecDeque<u8>,
    origin: Instant,
    /// Device time of the next frame (ms since power-up)
    next_frame_ms: u64,
    read_timeout: Duration,
}

impl SimulatedDevice {
    /// Create a device with an entropy-seeded noise source
    pub fn new(config: DemoConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a device whose frame contents are reproducible
    pub fn with_seed(config: DemoConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DemoConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            buffer: VecDeque::new(),
            origin: Instant::now(),
            next_frame_ms: 0,
            read_timeout: Duration::from_millis(crate::protocol::DEFAULT_READ_TIMEOUT_MS),
        }
    }

    /// Bound on how long an empty read waits for the next frame
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Produce the next frame and advance the device clock.
    ///
    /// Does not touch the pacing buffer, so it can be used to build
    /// captures offline.
    pub fn next_frame(&mut self) -> [u8; FRAME_LENGTH] {
        let device_ms = self.next_frame_ms;
        self.next_frame_ms += self.config.interval_ms.max(1);

        let t = device_ms as f64 / 1000.0;
        let phase = if self.config.period_s > 0.0 {
            (TAU * t / self.config.period_s).sin()
        } else {
            0.0
        };
        let jitter = if self.config.noise > 0.0 {
            self.rng.gen_range(-self.config.noise..=self.config.noise)
        } else {
            0.0
        };
        let reading = (self.config.baseline + self.config.amplitude * phase + jitter)
            .clamp(0.0, ADC_MAX)
            .round() as u16;

        let end = if self.rng.gen_bool(self.config.corruption_rate.clamp(0.0, 1.0)) {
            match self.rng.gen::<u8>() {
                END_MARKER => 0,
                other => other,
            }
        } else {
            END_MARKER
        };

        let ts = (device_ms & 0xFFFF) as u16;
        let [ts_lo, ts_hi] = ts.to_le_bytes();
        let [rd_lo, rd_hi] = reading.to_le_bytes();
        [START_MARKER, ts_lo, ts_hi, rd_lo, rd_hi, end, NEWLINE]
    }

    /// Queue every frame whose device time has been reached
    fn pump(&mut self) {
        let now_ms = self.origin.elapsed().as_millis() as u64;
        while self.next_frame_ms <= now_ms {
            let frame = self.next_frame();
            self.buffer.extend(frame);
        }
    }

    fn until_next_frame(&self) -> Duration {
        Duration::from_millis(self.next_frame_ms).saturating_sub(self.origin.elapsed())
    }
}

impl ByteSource for SimulatedDevice {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.pump();
        if self.buffer.is_empty() {
            thread::sleep(self.until_next_frame().min(self.read_timeout));
            self.pump();
        }

        let count = n.min(self.buffer.len());
        Ok(self.buffer.drain(..count).collect())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.pump();
        Ok(self.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Packet;

    #[test]
    fn test_frame_layout() {
        let mut device = SimulatedDevice::with_seed(DemoConfig::default(), 7);
        let first = device.next_frame();
        let second = device.next_frame();

        assert_eq!(first[0], START_MARKER);
        assert_eq!(first[5], END_MARKER);
        assert_eq!(first[6], NEWLINE);

        let a = Packet::from_bytes(&first[1..6]).unwrap();
        let b = Packet::from_bytes(&second[1..6]).unwrap();
        assert_eq!(a.device_timestamp_ms(), 0);
        assert_eq!(b.device_timestamp_ms(), 5);
        assert!(a.reading() <= 1023);
    }

    #[test]
    fn test_seeded_devices_agree() {
        let mut a = SimulatedDevice::with_seed(DemoConfig::default(), 42);
        let mut b = SimulatedDevice::with_seed(DemoConfig::default(), 42);
        for _ in 0..20 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_full_corruption() {
        let config = DemoConfig {
            corruption_rate: 1.0,
            ..Default::default()
        };
        let mut device = SimulatedDevice::with_seed(config, 1);
        for _ in 0..50 {
            assert_ne!(device.next_frame()[5], END_MARKER);
        }
    }

    #[test]
    fn test_device_clock_wraps() {
        let config = DemoConfig {
            interval_ms: 65_535,
            ..Default::default()
        };
        let mut device = SimulatedDevice::with_seed(config, 3);
        device.next_frame();
        device.next_frame();
        let third = device.next_frame();
        // 2 * 65535 = 131070 = 0x1_FFFE
        assert_eq!(u16::from_le_bytes([third[1], third[2]]), 0xFFFE);
    }

    #[test]
    fn test_paced_reads() {
        let config = DemoConfig {
            interval_ms: 1,
            ..Default::default()
        };
        let mut device = SimulatedDevice::with_seed(config, 9);
        device.set_read_timeout(Duration::from_millis(50));

        let first = device.read(1).unwrap();
        assert_eq!(first, vec![START_MARKER]);
        thread::sleep(Duration::from_millis(5));
        assert!(device.bytes_available().unwrap() >= FRAME_LENGTH - 1);
    }
}
