//! Testing utilities for the wire layer
//!
//! - **Sinks**: in-memory and failing [`ByteSink`](tracespy_core::ByteSink)s
//!   that record what the writer did
//! - **Stream reader**: a decoder for capture streams, used to check the
//!   shape of what an encoder produced
//!
//! # Example
//!
//! ```ignore
//! use tracespy_wire::testing::{MemorySink, StreamReader};
//!
//! let sink = MemorySink::new();
//! // ... hand `sink.clone()` to an encoder and emit ...
//! let chunks = StreamReader::read_all(&sink.contents())?;
//! ```

mod reader;
mod sinks;

pub use reader::{decode_fields, Chunk, FieldValue, StreamReader};
pub use sinks::{MemorySink, ShortWriteSink};
