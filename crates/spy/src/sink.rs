//! `std::io::Write` sink adapter.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracespy_core::ByteSink;
use tracing::warn;

/// Capture sink over any writer: a file, a TCP stream, a pipe.
///
/// An I/O error is reported to the chunk writer as a write of zero bytes,
/// which makes the capture unhealthy.
#[derive(Debug)]
pub struct IoSink<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> IoSink<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    /// The wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl IoSink<File> {
    /// Create (or truncate) a capture file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(IoSink::new(File::create(path)?))
    }
}

impl<W: Write + Send> ByteSink for IoSink<W> {
    fn write(&mut self, buf: &[u8]) -> usize {
        match self.inner.write_all(buf).and_then(|_| self.inner.flush()) {
            Ok(()) => buf.len(),
            Err(e) => {
                warn!(error = %e, bytes = buf.len(), "Capture sink write failed");
                0
            }
        }
    }
}
