//! Logger configuration
//!
//! Settings can come from a JSON file; anything missing falls back to the
//! defaults below. Command line flags are applied on top by the caller.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::clock::ClockKind;
use crate::datalog::{RecorderConfig, START_GRACE};
use crate::demo::DemoConfig;
use crate::protocol::{FramerOptions, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};

/// Output file used when none is given
pub const DEFAULT_OUTPUT: &str = "TEST.txt";

/// Serial port used when none is given
#[cfg(target_os = "windows")]
pub const DEFAULT_PORT: &str = "COM7";
/// Serial port used when none is given
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Errors loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for [`LoggerConfig`]
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Duration is negative or not a number
    #[error("Invalid duration {0}: must be a non-negative number of seconds")]
    InvalidDuration(f64),
}

/// Everything needed to run one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Serial port name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Poll timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Sample log path
    pub output: PathBuf,
    /// Recording length in seconds; `None` runs until interrupted
    pub duration_s: Option<f64>,
    /// Clock used to stamp samples
    pub clock: ClockKind,
    /// Print samples to stdout while recording
    pub echo: bool,
    /// Packet wait tuning
    pub framer: FramerOptions,
    /// Simulated sensor settings, used in demo mode
    pub demo: DemoConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            output: PathBuf::from(DEFAULT_OUTPUT),
            duration_s: None,
            clock: ClockKind::default(),
            echo: true,
            framer: FramerOptions::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.duration()?;
        Ok(config)
    }

    /// Recording length, validated
    pub fn duration(&self) -> Result<Option<Duration>, ConfigError> {
        match self.duration_s {
            None => Ok(None),
            Some(secs) if secs.is_infinite() && secs > 0.0 => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|_| ConfigError::InvalidDuration(secs)),
        }
    }

    /// Serial poll timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Recorder settings derived from this configuration
    pub fn recorder_config(&self) -> Result<RecorderConfig, ConfigError> {
        Ok(RecorderConfig {
            duration: self.duration()?,
            grace: START_GRACE,
            echo: self.echo,
        })
    }
}
