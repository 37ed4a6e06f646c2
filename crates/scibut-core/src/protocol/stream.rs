//! Byte sources
//!
//! The framer reads through [`ByteSource`] so the same decoding path serves a
//! live serial port, a replayed capture, or the simulated device.

use serialport::SerialPort;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Abstraction over a stream of bytes arriving from the sensor
pub trait ByteSource {
    /// Read up to `n` bytes.
    ///
    /// Blocks for at most the transport's read timeout and may return fewer
    /// bytes than requested. An empty vector means nothing arrived in time.
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Number of bytes that can be read without waiting
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// True when no bytes beyond those already available will ever arrive.
    ///
    /// Live transports never end; replayed captures do.
    fn end_of_input(&self) -> bool {
        false
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        (**self).read(n)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn end_of_input(&self) -> bool {
        (**self).end_of_input()
    }
}

/// Serial port wrapper implementing ByteSource
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    /// Wrap an opened, configured port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Name of the underlying port, if the driver reports one
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl ByteSource for SerialSource {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;

        // Keep reading until the request is satisfied or the port times out
        while filled < n {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::other)
    }
}

/// In-memory byte source, used for replaying captured streams
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: VecDeque<u8>,
}

impl MemorySource {
    /// Create a source that yields `data` and then ends
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into().into(),
        }
    }

    /// Load a raw capture from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }

    /// Append more bytes to the end of the stream
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend(bytes);
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

impl ByteSource for MemorySource {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let count = n.min(self.data.len());
        Ok(self.data.drain(..count).collect())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.data.len())
    }

    fn end_of_input(&self) -> bool {
        true
    }
}
