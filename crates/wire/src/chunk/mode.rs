//! Flush mode configuration
//!
//! Controls when buffered chunk bytes are handed to the sink.

/// Flush mode for the chunk writer
///
/// | Mode | Sink write | Use |
/// |------|-----------|-----|
/// | Buffered | once `threshold` bytes accumulate | steady-state capture |
/// | Immediate | on every `write` | handshakes, latency-sensitive peers |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Accumulate bytes and flush when the buffer reaches `threshold`.
    Buffered {
        /// Buffer size that triggers a flush
        threshold: usize,
    },

    /// Flush after every write.
    Immediate,
}

impl FlushMode {
    /// Buffered mode with the default 32 KiB threshold.
    pub fn buffered_default() -> Self {
        FlushMode::Buffered {
            threshold: 32 * 1024,
        }
    }

    /// True if `buffered_len` bytes should be flushed now.
    #[inline]
    pub fn should_flush(&self, buffered_len: usize) -> bool {
        match self {
            FlushMode::Buffered { threshold } => buffered_len >= *threshold,
            FlushMode::Immediate => buffered_len > 0,
        }
    }
}

impl Default for FlushMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}
