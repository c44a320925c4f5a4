//! Resource and observation records.

use once_cell::sync::Lazy;
use tracespy_core::{Encodable, FieldKind, Interval, PoolId, ResourceId, TypeDescriptor};
use tracespy_wire::MessageWriter;

static RESOURCE: Lazy<TypeDescriptor> = Lazy::new(|| {
    TypeDescriptor::new("tracespy.Resource")
        .with_field("id", 1, FieldKind::Bytes)
        .with_field("data", 2, FieldKind::Bytes)
});

static MEMORY_OBSERVATION: Lazy<TypeDescriptor> = Lazy::new(|| {
    TypeDescriptor::new("tracespy.MemoryObservation")
        .with_field("base", 1, FieldKind::UInt64)
        .with_field("size", 2, FieldKind::UInt64)
        .with_field("pool", 3, FieldKind::UInt64)
        .with_field("resource", 4, FieldKind::Bytes)
});

/// A content-addressed blob, written once per capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Digest of `data`
    pub id: ResourceId,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Resource {
    /// Wrap `data`, computing its identity.
    pub fn new(data: Vec<u8>) -> Self {
        Resource {
            id: ResourceId::for_content(&data),
            data,
        }
    }

    /// Structural type of this record.
    pub fn type_descriptor() -> &'static TypeDescriptor {
        &RESOURCE
    }
}

impl Encodable for Resource {
    fn descriptor(&self) -> &TypeDescriptor {
        &RESOURCE
    }

    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out)
            .bytes(1, self.id.as_bytes())
            .bytes(2, &self.data);
    }
}

/// The fact that a call touched a byte range, by reference to its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryObservation {
    /// Address (application memory) or offset (pool)
    pub base: u64,
    /// Bytes covered
    pub size: u64,
    /// Address space `base` belongs to
    pub pool: PoolId,
    /// Content of the range
    pub resource: ResourceId,
}

impl MemoryObservation {
    /// Observation of `range` in `pool` with content `resource`.
    pub fn new(range: Interval, pool: PoolId, resource: ResourceId) -> Self {
        MemoryObservation {
            base: range.start,
            size: range.len(),
            pool,
            resource,
        }
    }

    /// Structural type of this record.
    pub fn type_descriptor() -> &'static TypeDescriptor {
        &MEMORY_OBSERVATION
    }
}

impl Encodable for MemoryObservation {
    fn descriptor(&self) -> &TypeDescriptor {
        &MEMORY_OBSERVATION
    }

    fn encode(&self, out: &mut Vec<u8>) {
        MessageWriter::new(out)
            .uint(1, self.base)
            .uint(2, self.size)
            .uint(3, self.pool.0 as u64)
            .bytes(4, self.resource.as_bytes());
    }
}
