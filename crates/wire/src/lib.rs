//! Wire layer for tracespy
//!
//! This crate owns everything that turns records into bytes on a sink:
//!
//! - Varint/zigzag integer primitives
//! - Protocol header ("ProtoPack 2.0", with legacy recognition)
//! - Chunk writer: buffering, single-write flushes, sticky sink failure
//! - Pack encoder: type registration, object/group framing, parent deltas
//! - No-op encoder for calls that are not being traced
//! - Test harness: in-memory sinks and a stream decoder

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod error;
pub mod header;
pub mod message;
pub mod pack;
pub mod testing;
pub mod varint;

pub use chunk::{ChunkWriter, FlushMode, WriterConfig, WriterConfigError, WriterCounters};
pub use error::WireError;
pub use header::{Header, HEADER_V2, LEGACY_MAGIC};
pub use message::{encode_descriptor, MessageWriter};
pub use pack::{Encoder, NullEncoder, PackEncoder};
