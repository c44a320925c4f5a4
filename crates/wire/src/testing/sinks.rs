//! Sinks that record or sabotage writes.

use parking_lot::Mutex;
use std::sync::Arc;
use tracespy_core::ByteSink;

#[derive(Debug, Default)]
struct Recorded {
    bytes: Vec<u8>,
    calls: usize,
}

/// Sink that accepts everything and keeps it in memory.
///
/// Clones share the same storage, so a test keeps one clone and hands the
/// other to the writer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }

    /// Number of `write` calls received.
    pub fn write_calls(&self) -> usize {
        self.inner.lock().calls
    }
}

impl ByteSink for MemorySink {
    fn write(&mut self, buf: &[u8]) -> usize {
        let mut inner = self.inner.lock();
        inner.bytes.extend_from_slice(buf);
        inner.calls += 1;
        buf.len()
    }
}

#[derive(Debug)]
struct Budget {
    remaining: usize,
    calls: usize,
    bytes: Vec<u8>,
}

/// Sink that accepts a fixed number of bytes in total, then writes short.
#[derive(Debug, Clone)]
pub struct ShortWriteSink {
    inner: Arc<Mutex<Budget>>,
}

impl ShortWriteSink {
    /// Create a sink that accepts `budget` bytes before failing.
    pub fn new(budget: usize) -> Self {
        ShortWriteSink {
            inner: Arc::new(Mutex::new(Budget {
                remaining: budget,
                calls: 0,
                bytes: Vec::new(),
            })),
        }
    }

    /// Number of `write` calls received, including failed ones.
    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }

    /// Bytes accepted so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }
}

impl ByteSink for ShortWriteSink {
    fn write(&mut self, buf: &[u8]) -> usize {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        let n = buf.len().min(inner.remaining);
        inner.remaining -= n;
        inner.bytes.extend_from_slice(&buf[..n]);
        n
    }
}
