//! Capture sessions for tracespy
//!
//! The session is the context object an interception layer holds for the
//! lifetime of one capture: it owns the root encoder, the capture-wide
//! resource and pool state, and the gate deciding which calls are traced.
//!
//! - CaptureConfig: `tracespy.toml` configuration
//! - CaptureSession: root context handed to interceptors
//! - IoSink: adapts `std::io::Write` transports to the capture sink

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod session;
pub mod sink;

pub use config::{CaptureConfig, ConfigError, CONFIG_FILE_NAME};
pub use session::CaptureSession;
pub use sink::IoSink;
