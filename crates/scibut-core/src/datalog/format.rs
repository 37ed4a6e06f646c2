//! Sample log format
//!
//! One sample per line, space separated:
//!
//! ```text
//! <device_timestamp_ms> <reading> <host_time_s>
//! ```
//!
//! Host time is written with six fractional digits.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::DatalogError;
use crate::protocol::Sample;

/// Render a sample as a log line, newline included
pub fn format_sample(sample: &Sample) -> String {
    format!(
        "{} {} {:.6}\n",
        sample.device_timestamp_ms, sample.reading, sample.host_time_s
    )
}

/// Parse one log line back into a sample. `line_no` is only used in errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<Sample, DatalogError> {
    let malformed = |reason: &str| DatalogError::MalformedLine {
        line: line_no,
        reason: reason.to_string(),
    };

    let mut fields = line.split_whitespace();
    let device_timestamp_ms = fields
        .next()
        .ok_or_else(|| malformed("missing device timestamp"))?
        .parse::<u16>()
        .map_err(|e| malformed(&e.to_string()))?;
    let reading = fields
        .next()
        .ok_or_else(|| malformed("missing reading"))?
        .parse::<u16>()
        .map_err(|e| malformed(&e.to_string()))?;
    let host_time_s = fields
        .next()
        .ok_or_else(|| malformed("missing host time"))?
        .parse::<f64>()
        .map_err(|e| malformed(&e.to_string()))?;

    if fields.next().is_some() {
        return Err(malformed("trailing fields"));
    }

    Ok(Sample {
        device_timestamp_ms,
        reading,
        host_time_s,
    })
}

/// Read every sample from a log file, skipping blank lines
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>, DatalogError> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_line(&line, idx + 1)?);
    }

    Ok(samples)
}
