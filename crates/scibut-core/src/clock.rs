//! Host clocks
//!
//! Every sample carries the host time at which its start marker was read.
//! The clock is injected into the framer so that stamping can be tested.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of host timestamps in seconds
pub trait HostClock: Send {
    /// Current host time in seconds
    fn now_secs(&self) -> f64;
}

impl<C: HostClock + ?Sized> HostClock for Box<C> {
    fn now_secs(&self) -> f64 {
        (**self).now_secs()
    }
}

/// Seconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Seconds since the Unix epoch, microsecond resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl HostClock for WallClock {
    fn now_secs(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `secs`
    pub fn new(secs: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(secs.to_bits())),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, secs: f64) {
        self.set(self.now_secs() + secs);
    }
}

impl HostClock for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Which host clock stamps samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Seconds since the recording started
    #[default]
    Monotonic,
    /// Seconds since the Unix epoch
    Wall,
}

impl ClockKind {
    /// Instantiate the selected clock
    pub fn build(self) -> Box<dyn HostClock> {
        match self {
            ClockKind::Monotonic => Box::new(MonotonicClock::new()),
            ClockKind::Wall => Box::new(WallClock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_starts_near_zero() {
        let clock = MonotonicClock::new();
        let t = clock.now_secs();
        assert!((0.0..1.0).contains(&t));
        assert!(clock.now_secs() >= t);
    }

    #[test]
    fn test_wall_clock_is_epoch_based() {
        // 2020-01-01T00:00:00Z
        assert!(WallClock.now_secs() > 1_577_836_800.0);
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(1.5);
        let handle = clock.clone();
        handle.advance(0.25);
        assert_eq!(clock.now_secs(), 1.75);
        clock.set(10.0);
        assert_eq!(handle.now_secs(), 10.0);
    }

    #[test]
    fn test_clock_kind_serde() {
        let kind: ClockKind = serde_json::from_str("\"wall\"").unwrap();
        assert_eq!(kind, ClockKind::Wall);
        assert_eq!(serde_json::to_string(&ClockKind::Monotonic).unwrap(), "\"monotonic\"");
    }
}
