//! Writer configuration.

use super::FlushMode;
use serde::{Deserialize, Serialize};

/// Maximum number of sharded type-id caches.
pub const MAX_TYPE_CACHE_SHARDS: usize = 64;

/// Chunk writer and encoder configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Buffered bytes that trigger a sink write (default: 32KB).
    pub buffer_threshold: usize,

    /// Whether chunks are buffered at all (default: true).
    ///
    /// When false every chunk is written to the sink as soon as it is
    /// framed.
    pub buffered: bool,

    /// Number of independently lockable type-id caches (default: 4).
    pub type_cache_shards: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            buffer_threshold: 32 * 1024, // 32KB
            buffered: true,
            type_cache_shards: 4,
        }
    }
}

impl WriterConfig {
    /// Create a new writer configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set buffer threshold (builder pattern).
    pub fn with_buffer_threshold(mut self, bytes: usize) -> Self {
        self.buffer_threshold = bytes;
        self
    }

    /// Enable or disable buffering (builder pattern).
    pub fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    /// Set number of type cache shards (builder pattern).
    pub fn with_type_cache_shards(mut self, shards: usize) -> Self {
        self.type_cache_shards = shards;
        self
    }

    /// Flush mode implied by this configuration.
    pub fn flush_mode(&self) -> FlushMode {
        if self.buffered {
            FlushMode::Buffered {
                threshold: self.buffer_threshold,
            }
        } else {
            FlushMode::Immediate
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), WriterConfigError> {
        if self.buffer_threshold == 0 {
            return Err(WriterConfigError::ZeroBufferThreshold);
        }
        if self.type_cache_shards == 0 || self.type_cache_shards > MAX_TYPE_CACHE_SHARDS {
            return Err(WriterConfigError::TypeCacheShards(self.type_cache_shards));
        }
        Ok(())
    }

    /// Create a configuration for tests: unbuffered, so every chunk is
    /// visible on the sink as soon as it is emitted.
    pub fn for_testing() -> Self {
        WriterConfig {
            buffer_threshold: 1024,
            buffered: false,
            type_cache_shards: 4,
        }
    }
}

/// Writer configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriterConfigError {
    /// Buffer threshold is zero.
    #[error("Buffer threshold must be at least 1 byte")]
    ZeroBufferThreshold,

    /// Type cache shard count out of range.
    #[error("Type cache shards must be between 1 and 64, got {0}")]
    TypeCacheShards(usize),
}
