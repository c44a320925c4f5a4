//! tracespy - capture encoding and memory observation for graphics API spies
//!
//! An interception layer sits between an application and its graphics
//! driver, forwarding every call while recording it. This crate is the part
//! that turns those recordings into a replayable stream:
//!
//! - memory ranges touched by a call become content-addressed resources,
//!   each written once, plus an observation per touch
//! - typed records are framed into a self-describing chunk stream with
//!   inline type definitions and parent/child groups
//! - full state snapshots walk a live object graph and the memory pools it
//!   references
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracespy::{CaptureConfig, CaptureSession, ProcessMemory};
//!
//! let session = CaptureSession::create_file("app.capture".as_ref(), CaptureConfig::default())?;
//! let memory = Arc::new(unsafe { ProcessMemory::new() });
//!
//! // For each intercepted call:
//! let mut call = session.begin_call(API_GLES, memory.clone());
//! call.enter(&command);
//! call.read(ptr as u64, len as u64);
//! call.exit();
//! ```
//!
//! # Architecture
//!
//! - `tracespy-core`: identifiers, type descriptors, the `Encodable` and
//!   `ByteSink` seams, errors
//! - `tracespy-wire`: varints, chunk writer, pack encoder
//! - `tracespy-observe`: per-call memory observation
//! - `tracespy-state`: pools and state snapshots
//! - `tracespy-spy`: configuration and the capture session

pub use tracespy_core::{
    ByteSink, ChunkId, Encodable, Error, FieldKind, Interval, PoolId, ResourceId, Result,
    TypeDescriptor, TypeId,
};
pub use tracespy_observe::{
    BufferMemory, CallObserver, MemoryObservation, MemorySource, ObserverConfig, ProcessMemory,
    Resource, SeenResources,
};
pub use tracespy_spy::{CaptureConfig, CaptureSession, ConfigError, IoSink, CONFIG_FILE_NAME};
pub use tracespy_state::{
    reference_type, PoolArena, PoolMemory, SerializeContext, Slice, SnapshotStats, StateObject,
    StateSerializer,
};
pub use tracespy_wire::{
    Encoder, FlushMode, Header, MessageWriter, NullEncoder, PackEncoder, WriterConfig,
    WriterCounters, HEADER_V2,
};

/// Stream decoding and in-memory sinks for tests.
pub mod testing {
    pub use tracespy_wire::testing::*;
}
