//! Records written by the state serializer.

use once_cell::sync::Lazy;
use std::sync::Arc;
use tracespy_core::{Encodable, FieldKind, PoolId, TypeDescriptor};
use tracespy_wire::MessageWriter;

static GLOBAL_STATE_BEGIN: Lazy<TypeDescriptor> = Lazy::new(|| {
    TypeDescriptor::new("tracespy.GlobalStateBegin").with_field("root", 1, FieldKind::String)
});

static SLICE: Lazy<Arc<TypeDescriptor>> = Lazy::new(|| {
    Arc::new(
        TypeDescriptor::new("tracespy.Slice")
            .with_field("pool", 1, FieldKind::UInt64)
            .with_field("base", 2, FieldKind::UInt64)
            .with_field("size", 3, FieldKind::UInt64),
    )
});

/// Marks the start of a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStateBegin {
    /// Type name of the snapshot's root object
    pub root: String,
}

impl Encodable for GlobalStateBegin {
    fn descriptor(&self) -> &TypeDescriptor {
        &GLOBAL_STATE_BEGIN
    }

    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out).string(1, &self.root);
    }
}

/// A range of a pool referenced from the object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// Pool the range lives in
    pub pool: PoolId,
    /// Offset into the pool
    pub base: u64,
    /// Length in bytes
    pub size: u64,
}

impl Slice {
    /// Structural type of this record, for use in parent descriptors.
    pub fn type_descriptor() -> Arc<TypeDescriptor> {
        Arc::clone(&SLICE)
    }
}

impl Encodable for Slice {
    fn descriptor(&self) -> &TypeDescriptor {
        &SLICE
    }

    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out)
            .uint(1, self.pool.0 as u64)
            .uint(2, self.base)
            .uint(3, self.size);
    }
}

/// Descriptor of a deduplicated reference to `target`.
///
/// A reference is `{1: id, 2: value}`; the value is present only the first
/// time an object is written in a snapshot, later references carry just
/// the id.
pub fn reference_type(target: &Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
    Arc::new(
        TypeDescriptor::new(format!("tracespy.Ref.{}", target.name()))
            .with_field("id", 1, FieldKind::UInt64)
            .with_field("value", 2, FieldKind::Message(Arc::clone(target))),
    )
}
