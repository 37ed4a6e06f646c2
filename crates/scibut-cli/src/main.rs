//! SciBut recorder
//!
//! Reads framed sensor packets from a serial port (or a simulated sensor, or
//! a raw capture) and writes one line per sample until the requested duration
//! has passed or the user presses Ctrl-C.

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use scibut_core::clock::HostClock;
use scibut_core::config::LoggerConfig;
use scibut_core::datalog::{Recorder, SampleWriter};
use scibut_core::demo::SimulatedDevice;
use scibut_core::protocol::{self, ByteSource, Framer, MemorySource, ProtocolError};
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use args::Args;

type Source = Box<dyn ByteSource + Send>;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries echoed samples
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.list_ports {
        let ports = protocol::list_ports();
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{}", port);
        }
        return Ok(());
    }

    let demo = args.demo;
    let replay = args.replay.clone();
    let config = args.into_config()?;

    let source: Source = if demo {
        info!("Recording from simulated sensor");
        let mut device = SimulatedDevice::new(config.demo.clone());
        device.set_read_timeout(config.read_timeout());
        Box::new(device)
    } else if let Some(path) = replay {
        info!("Replaying capture {}", path.display());
        Box::new(
            MemorySource::from_file(&path)
                .with_context(|| format!("reading capture {}", path.display()))?,
        )
    } else {
        let port = open_serial(&config)?;
        info!(
            "Recording from {}",
            port.name().unwrap_or_else(|| config.port.clone())
        );
        Box::new(port)
    };

    record(config, source).await
}

fn open_serial(config: &LoggerConfig) -> Result<protocol::SerialSource> {
    protocol::open_port(&config.port, Some(config.baud_rate), config.read_timeout()).map_err(
        |e| match e {
            ProtocolError::TransportUnavailable { port, reason } => anyhow::anyhow!(
                "Cannot open serial port {}. Is the device connected? ({})",
                port,
                reason
            ),
            other => other.into(),
        },
    )
}

async fn record(config: LoggerConfig, mut source: Source) -> Result<()> {
    let clock: Box<dyn HostClock> = config.clock.build();
    let framer = Framer::with_options(clock, config.framer);
    let recorder = Recorder::new(framer, config.recorder_config()?);
    let cancel = recorder.cancel_handle();

    let mut writer = SampleWriter::create(&config.output)
        .with_context(|| format!("creating {}", config.output.display()))?;
    info!("Writing samples to {}", config.output.display());

    let mut task = tokio::task::spawn_blocking(move || recorder.run(&mut source, &mut writer));

    let stats = tokio::select! {
        joined = &mut task => joined??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            info!("Interrupted, stopping after the current packet");
            cancel.store(true, Ordering::SeqCst);

            // A packet wait has no timeout by default; a second Ctrl-C bails out
            tokio::select! {
                joined = &mut task => joined??,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted again while waiting for a packet, exiting");
                    std::process::exit(130);
                }
            }
        }
    };

    info!(
        "Recorded {} samples ({} rejected packets, {} stray bytes) in {:.1}s",
        stats.samples,
        stats.rejected_packets(),
        stats.unexpected_bytes,
        stats.elapsed.as_secs_f64()
    );

    Ok(())
}
