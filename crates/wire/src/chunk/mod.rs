//! Chunk writer module
//!
//! - `mode`: buffered vs immediate flushing (FlushMode)
//! - `config`: writer configuration (WriterConfig, WriterConfigError)
//! - `writer`: the buffering chunk writer (ChunkWriter)

pub mod config;
pub mod mode;
pub mod writer;

pub use config::{WriterConfig, WriterConfigError};
pub use mode::FlushMode;
pub use writer::{ChunkWriter, WriterCounters};
