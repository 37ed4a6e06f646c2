//! Command line arguments
//!
//! Positional arguments: output file, serial port, duration in seconds.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scibut_core::clock::ClockKind;
use scibut_core::config::LoggerConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scibut", version, about = "Record SciBut sensor samples from a serial port")]
pub struct Args {
    /// Output file for samples [default: TEST.txt]
    pub output: Option<PathBuf>,

    /// Serial port the sensor is attached to
    pub port: Option<String>,

    /// Recording duration in seconds [default: until interrupted]
    pub duration: Option<f64>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Serial poll timeout in milliseconds
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Abandon a started packet after this many milliseconds [default: wait forever]
    #[arg(long)]
    pub packet_timeout_ms: Option<u64>,

    /// Sleep between availability checks while waiting for a packet, in microseconds
    #[arg(long)]
    pub poll_backoff_us: Option<u64>,

    /// Clock used to stamp samples
    #[arg(long, value_enum)]
    pub clock: Option<ClockArg>,

    /// Don't echo samples to stdout
    #[arg(long, short)]
    pub quiet: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Record from a simulated sensor instead of a serial port
    #[arg(long, conflicts_with = "replay")]
    pub demo: bool,

    /// Decode a raw byte capture instead of a serial port
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    /// Seconds since recording started
    Monotonic,
    /// Seconds since the Unix epoch
    Wall,
}

impl From<ClockArg> for ClockKind {
    fn from(arg: ClockArg) -> Self {
        match arg {
            ClockArg::Monotonic => ClockKind::Monotonic,
            ClockArg::Wall => ClockKind::Wall,
        }
    }
}

impl Args {
    /// Resolve the effective configuration: defaults, then file, then flags
    pub fn into_config(self) -> Result<LoggerConfig> {
        let from_file = self.config.is_some();
        let mut config = match &self.config {
            Some(path) => LoggerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => LoggerConfig::default(),
        };

        match self.output {
            Some(output) => config.output = output,
            None if !from_file => {
                info!("Default filename used: {}", config.output.display())
            }
            None => {}
        }

        match self.port {
            Some(port) => config.port = port,
            None if !from_file && !self.demo && self.replay.is_none() => {
                info!("Serial port {} will be used", config.port)
            }
            None => {}
        }

        match self.duration {
            Some(secs) => config.duration_s = Some(secs),
            None if config.duration_s.is_none() => {
                info!("Recording requires manual termination (Ctrl-C)")
            }
            None => {}
        }

        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(timeout) = self.read_timeout_ms {
            config.read_timeout_ms = timeout;
        }
        if let Some(timeout) = self.packet_timeout_ms {
            config.framer.packet_timeout_ms = Some(timeout);
        }
        if let Some(backoff) = self.poll_backoff_us {
            config.framer.poll_backoff_us = Some(backoff);
        }
        if let Some(clock) = self.clock {
            config.clock = clock.into();
        }
        if self.quiet {
            config.echo = false;
        }

        // Catch a bad duration before the port is opened
        config.duration()?;
        Ok(config)
    }
}
