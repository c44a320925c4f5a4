//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use once_cell::sync::Lazy;
use std::sync::Arc;
pub use tracespy::testing::{decode_fields, Chunk, FieldValue, MemorySink, ShortWriteSink, StreamReader};
pub use tracespy::{
    BufferMemory, CallObserver, CaptureConfig, CaptureSession, ChunkId, Encodable, Encoder,
    FieldKind, MemorySource, MessageWriter, PackEncoder, PoolId, TypeDescriptor, TypeId,
    WriterConfig, HEADER_V2,
};

// ============================================================================
// Records
// ============================================================================

static FOO: Lazy<TypeDescriptor> =
    Lazy::new(|| TypeDescriptor::new("test.Foo").with_field("id", 1, FieldKind::UInt64));

static BAR: Lazy<TypeDescriptor> = Lazy::new(|| TypeDescriptor::new("test.Bar"));

static BAZ: Lazy<TypeDescriptor> =
    Lazy::new(|| TypeDescriptor::new("test.Baz").with_field("x", 1, FieldKind::SInt64));

/// `Foo { id }`
pub struct Foo(pub u64);

impl Encodable for Foo {
    fn descriptor(&self) -> &TypeDescriptor {
        &FOO
    }
    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out).uint(1, self.0);
    }
}

/// `Bar {}`
pub struct Bar;

impl Encodable for Bar {
    fn descriptor(&self) -> &TypeDescriptor {
        &BAR
    }
    fn encode(&self, _out: &mut Vec<u8>) {}
}

/// `Baz { x }`
pub struct Baz(pub i64);

impl Encodable for Baz {
    fn descriptor(&self) -> &TypeDescriptor {
        &BAZ
    }
    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out).sint(1, self.0);
    }
}

// ============================================================================
// Sessions and encoders
// ============================================================================

/// Unbuffered root encoder over an in-memory sink.
pub fn root_encoder() -> (Arc<PackEncoder>, MemorySink) {
    let sink = MemorySink::new();
    let encoder = PackEncoder::new(Box::new(sink.clone()), &WriterConfig::for_testing());
    (Arc::new(encoder), sink)
}

/// Session over an in-memory sink.
pub fn open_session(config: CaptureConfig) -> (CaptureSession, MemorySink) {
    let sink = MemorySink::new();
    let session = CaptureSession::open(Box::new(sink.clone()), config).unwrap();
    (session, sink)
}

/// Application memory mapped at `base`.
pub fn app_memory(base: u64, bytes: &[u8]) -> Arc<dyn MemorySource> {
    Arc::new(BufferMemory::new(PoolId::APPLICATION, base, bytes.to_vec()))
}

// ============================================================================
// Stream inspection
// ============================================================================

/// Decode everything written to `sink`.
pub fn decode(sink: &MemorySink) -> Vec<Chunk> {
    StreamReader::read_all(&sink.contents()).unwrap()
}

/// Type names indexed by type id.
pub fn type_names(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .filter_map(|c| match c {
            Chunk::TypeDef { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Type names of every object and group opening, in stream order.
pub fn object_names(chunks: &[Chunk]) -> Vec<String> {
    let types = type_names(chunks);
    chunks
        .iter()
        .filter_map(|c| c.type_id().map(|t| types[t.0 as usize].clone()))
        .collect()
}

/// Number of objects of type `name`.
pub fn count_objects(chunks: &[Chunk], name: &str) -> usize {
    object_names(chunks).iter().filter(|n| *n == name).count()
}
