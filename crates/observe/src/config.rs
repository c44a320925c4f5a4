//! Observer configuration.

use serde::{Deserialize, Serialize};

/// Largest accepted merge threshold.
pub const MAX_MERGE_THRESHOLD: u64 = 1 << 20;

/// Memory-observation configuration parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Gap in bytes across which two observed ranges are coalesced
    /// (default: 0, only touching or overlapping ranges merge).
    pub merge_threshold: u64,
}

impl ObserverConfig {
    /// Create a new observer configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set merge threshold (builder pattern).
    pub fn with_merge_threshold(mut self, bytes: u64) -> Self {
        self.merge_threshold = bytes;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ObserverConfigError> {
        if self.merge_threshold > MAX_MERGE_THRESHOLD {
            return Err(ObserverConfigError::MergeThresholdTooLarge(
                self.merge_threshold,
            ));
        }
        Ok(())
    }

    /// Create a configuration for tests.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Observer configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserverConfigError {
    /// Merge threshold above [`MAX_MERGE_THRESHOLD`].
    #[error("Merge threshold must be at most 1MB, got {0} bytes")]
    MergeThresholdTooLarge(u64),
}
