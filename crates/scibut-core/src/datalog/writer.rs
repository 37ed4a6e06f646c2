//! Sample writer
//!
//! Write-through sink: each sample is flushed as soon as it is written so a
//! killed recording loses at most the packet in flight.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::format_sample;
use crate::protocol::Sample;

/// Append-only text sink for samples
pub struct SampleWriter<W: Write> {
    inner: W,
    written: u64,
}

impl SampleWriter<BufWriter<File>> {
    /// Create (or truncate) a sample log on disk
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SampleWriter<W> {
    /// Wrap an existing writer
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Write one sample line and flush it
    pub fn write_sample(&mut self, sample: &Sample) -> io::Result<()> {
        self.inner.write_all(format_sample(sample).as_bytes())?;
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of samples written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Borrow the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}
