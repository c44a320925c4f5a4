//! Chunk writer with sticky failure.
//!
//! The writer accumulates framed chunk bytes and hands them to the sink in
//! one `write` call per flush. The sink sits under a message-framed pipe
//! protocol, so a flush is never split into several sink writes.
//!
//! A flush that writes fewer bytes than requested marks the writer
//! unhealthy for the rest of its life. An unhealthy writer drops every
//! subsequent write without touching the sink; there is no retry.

use super::FlushMode;
use tracespy_core::ByteSink;
use tracing::{trace, warn};

/// Cumulative writer counters.
///
/// These accumulate over the lifetime of the writer and are never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterCounters {
    /// Calls to `write` that were accepted
    pub writes: u64,
    /// Sink writes performed
    pub flushes: u64,
    /// Bytes the sink reported as written
    pub bytes_written: u64,
}

/// Buffers byte spans and flushes them to a [`ByteSink`].
pub struct ChunkWriter {
    /// Destination
    sink: Box<dyn ByteSink>,

    /// Bytes not yet flushed
    buffer: Vec<u8>,

    /// When to flush
    mode: FlushMode,

    /// False once the sink has reported a short write
    healthy: bool,

    counters: WriterCounters,
}

impl ChunkWriter {
    /// Create a writer over `sink`.
    pub fn new(sink: Box<dyn ByteSink>, mode: FlushMode) -> Self {
        let capacity = match mode {
            FlushMode::Buffered { threshold } => threshold.min(1 << 20),
            FlushMode::Immediate => 0,
        };
        ChunkWriter {
            sink,
            buffer: Vec::with_capacity(capacity),
            mode,
            healthy: true,
            counters: WriterCounters::default(),
        }
    }

    /// Append `spans` in order, flushing if the mode calls for it.
    ///
    /// Returns whether the sink is still healthy. On an unhealthy writer
    /// this is a no-op returning `false`.
    pub fn write(&mut self, spans: &[&[u8]]) -> bool {
        if !self.healthy {
            return false;
        }

        for span in spans {
            self.buffer.extend_from_slice(span);
        }
        self.counters.writes += 1;

        if self.mode.should_flush(self.buffer.len()) {
            self.flush()
        } else {
            true
        }
    }

    /// Write all buffered bytes to the sink in a single call.
    ///
    /// The buffer is cleared whatever the outcome. Flushing an empty
    /// buffer does not touch the sink.
    pub fn flush(&mut self) -> bool {
        if !self.healthy {
            self.buffer.clear();
            return false;
        }
        if self.buffer.is_empty() {
            return true;
        }

        let requested = self.buffer.len();
        let written = self.sink.write(&self.buffer);
        self.counters.flushes += 1;
        self.counters.bytes_written += written.min(requested) as u64;
        self.buffer.clear();

        if written != requested {
            self.healthy = false;
            warn!(
                requested,
                written, "Capture sink short write; dropping all further chunks"
            );
        } else {
            trace!(bytes = written, "Flushed chunk buffer");
        }
        self.healthy
    }

    /// Change the flush mode. Switching to `Immediate` flushes pending bytes.
    pub fn set_mode(&mut self, mode: FlushMode) {
        self.mode = mode;
        if self.mode.should_flush(self.buffer.len()) {
            self.flush();
        }
    }

    /// Current flush mode.
    pub fn mode(&self) -> FlushMode {
        self.mode
    }

    /// False once the sink has failed.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Bytes waiting for the next flush.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Snapshot of cumulative counters.
    pub fn counters(&self) -> WriterCounters {
        self.counters.clone()
    }
}

impl Drop for ChunkWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            let _ = self.flush();
        }
    }
}
