//! Error types for tracespy
//!
//! Encoding paths never surface these to the traced application: writer
//! health is reported as a `bool` and invariant violations are fatal
//! assertions. This enum covers the fallible edges around the core
//! (configuration, transport setup, decoding in test harnesses) and the
//! abort signal interceptors propagate to their call boundary.

use std::io;
use thiserror::Error;

/// Result type alias for tracespy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the capture pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (opening a capture file, connecting a socket, etc.)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A capture stream could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// An intercepted call was abandoned; the call-bracket layer unwinds to
    /// its call boundary when it sees this.
    #[error("Call aborted (api {api}): {reason}")]
    Aborted {
        /// API index of the aborted call
        api: u8,
        /// Human-readable reason
        reason: String,
    },
}

impl Error {
    /// Create an abort signal for the given API.
    pub fn aborted(api: u8, reason: impl Into<String>) -> Self {
        Error::Aborted {
            api,
            reason: reason.into(),
        }
    }

    /// Returns true if this is an abort signal rather than a failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted { .. })
    }
}
