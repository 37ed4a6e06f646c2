//! # SciBut Core Library
//!
//! Core functionality for the SciBut serial sensor logger.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Start/end-marker packet framing over an unbuffered serial stream
//! - Decoding of the device clock and sensor reading
//! - Write-through sample logging with host timestamps
//! - A simulated sensor for running without hardware
//!
//! ## Example
//!
//! ```rust,ignore
//! use scibut_core::prelude::*;
//!
//! let mut source = open_port("/dev/ttyACM0", None, Duration::from_millis(250))?;
//! let framer = Framer::new(MonotonicClock::new());
//! let mut writer = SampleWriter::create("TEST.txt")?;
//!
//! let recorder = Recorder::new(framer, RecorderConfig::default());
//! let stats = recorder.run(&mut source, &mut writer)?;
//! println!("{} samples", stats.samples);
//! ```

pub mod clock;
pub mod config;
pub mod datalog;
pub mod demo;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{ClockKind, HostClock, MonotonicClock, WallClock};
    pub use crate::config::LoggerConfig;
    pub use crate::datalog::{Recorder, RecorderConfig, SampleWriter, SessionStats};
    pub use crate::demo::{DemoConfig, SimulatedDevice};
    pub use crate::protocol::{
        open_port, ByteSource, Framer, FramerOptions, MemorySource, Outcome, Sample,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
