//! Message field encoding and descriptor serialization.
//!
//! Record payloads use the protobuf field layout: each field is a key
//! `(number << 3) | wire_type` followed by either a varint (wire type 0) or
//! a length-prefixed byte run (wire type 2). Type-definition chunks carry
//! descriptors in the same layout:
//!
//! ```text
//! Descriptor:  1: name (string)   2: field (repeated FieldEntry)
//! FieldEntry:  1: name (string)   2: number   3: kind code
//!              4: repeated (bool) 5: message type name (string, message kind only)
//! ```

use crate::varint::{encode_i64, encode_u64};
use tracespy_core::{Encodable, TypeDescriptor};

/// Wire type for varint fields.
pub const WIRE_VARINT: u8 = 0;
/// Wire type for length-delimited fields.
pub const WIRE_LEN: u8 = 2;

/// Appends protobuf-style fields to a byte buffer.
pub struct MessageWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> MessageWriter<'a> {
    /// Write fields onto the end of `out`.
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        MessageWriter { out }
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        encode_u64(((field as u64) << 3) | wire_type as u64, self.out);
    }

    /// Unsigned varint field.
    pub fn uint(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WIRE_VARINT);
        encode_u64(value, self.out);
        self
    }

    /// Zigzag signed varint field.
    pub fn sint(&mut self, field: u32, value: i64) -> &mut Self {
        self.key(field, WIRE_VARINT);
        encode_i64(value, self.out);
        self
    }

    /// Boolean field.
    pub fn boolean(&mut self, field: u32, value: bool) -> &mut Self {
        self.uint(field, value as u64)
    }

    /// Length-delimited bytes field.
    pub fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WIRE_LEN);
        encode_u64(value.len() as u64, self.out);
        self.out.extend_from_slice(value);
        self
    }

    /// UTF-8 string field.
    pub fn string(&mut self, field: u32, value: &str) -> &mut Self {
        self.bytes(field, value.as_bytes())
    }

    /// Nested message field.
    pub fn message(&mut self, field: u32, value: &dyn Encodable) -> &mut Self {
        let mut nested = Vec::new();
        value.encode(&mut nested);
        self.bytes(field, &nested)
    }
}

/// Serialize the structural part of a type-definition chunk.
pub fn encode_descriptor(desc: &TypeDescriptor) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = MessageWriter::new(&mut out);
    w.string(1, desc.name());
    for field in desc.fields() {
        let mut entry = Vec::new();
        {
            let mut e = MessageWriter::new(&mut entry);
            e.string(1, &field.name)
                .uint(2, field.number as u64)
                .uint(3, field.kind.code() as u64)
                .boolean(4, field.repeated);
            if let Some(nested) = field.kind.message() {
                e.string(5, nested.name());
            }
        }
        w.bytes(2, &entry);
    }
    out
}
