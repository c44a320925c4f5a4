//! Pack encoder module
//!
//! - `registry`: canonical type table and sharded type-id caches
//! - `encoder`: the chunk-framing encoder (PackEncoder), root and groups
//! - `null`: the do-nothing encoder used when a call is not traced
//!
//! # Chunk Layout
//!
//! ```text
//! Chunk   := zigzag(size) Payload
//! size < 0:  type definition, |size| payload bytes
//!            varint(name_len) name descriptor
//! size >= 0: object, group opening or group end
//!            zigzag(parent_delta) zigzag(type_tag) message
//! ```
//!
//! Type ids are handed out from 0 in first-registration order. On the wire
//! `type_tag = id + 1` for objects, `-(id + 1)` for group openings, and `0`
//! for the end-of-group chunk, which carries no message.
//!
//! Objects and group openings are numbered from 1 in the order they reach
//! the writer. With `last` the most recently assigned number,
//! `parent_delta = last + 1 - parent` (0 for top-level chunks), so a decoder
//! recovers `parent = last + 1 - parent_delta` without ever seeing an
//! absolute id.

pub mod encoder;
pub mod null;
pub mod registry;

pub use encoder::PackEncoder;
pub use null::NullEncoder;
pub use registry::{TypeCaches, TypeTable};

use tracespy_core::{Encodable, TypeDescriptor, TypeId};

/// Type tag for a leaf object of type `id`.
#[inline]
pub fn object_tag(id: TypeId) -> i64 {
    id.0 as i64 + 1
}

/// Type tag for a group opening of type `id`.
#[inline]
pub fn group_tag(id: TypeId) -> i64 {
    -(id.0 as i64 + 1)
}

/// Type tag of an end-of-group chunk.
pub const GROUP_END_TAG: i64 = 0;

/// Encoding interface handed to interceptors.
///
/// Implemented by [`PackEncoder`] (root or group) and by [`NullEncoder`]
/// for calls that are not traced. All methods take `&self`; encoders are
/// shared between threads.
pub trait Encoder: Send + Sync {
    /// Return the stream-wide id for `desc`, defining it (and every type
    /// nested in it) on first use. The flag is true on first registration.
    ///
    /// Types are identified by name for the life of a stream: a later
    /// descriptor with a known name gets the existing id and schema.
    fn register_type(&self, desc: &TypeDescriptor) -> (TypeId, bool);

    /// Emit one object of a registered type.
    fn object(&self, type_id: TypeId, message: &[u8]);

    /// Emit a group opening and return an encoder whose chunks are its
    /// children. Dropping the returned encoder ends the group.
    fn group(&self, type_id: TypeId, message: &[u8]) -> Box<dyn Encoder>;

    /// Push buffered chunks to the sink. Returns sink health.
    fn flush(&self) -> bool;

    /// False for encoders that discard everything, including encoders whose
    /// sink has failed. Cheap enough to check before every record.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Register the record's type and emit it as an object.
    ///
    /// Nothing is encoded while the encoder is disabled.
    fn message(&self, record: &dyn Encodable) {
        if !self.is_enabled() {
            return;
        }
        let (type_id, _) = self.register_type(record.descriptor());
        let mut buf = Vec::new();
        record.encode(&mut buf);
        self.object(type_id, &buf);
    }

    /// Register the record's type and open a group with it. A disabled
    /// encoder hands back a [`NullEncoder`].
    fn message_group(&self, record: &dyn Encodable) -> Box<dyn Encoder> {
        if !self.is_enabled() {
            return Box::new(NullEncoder);
        }
        let (type_id, _) = self.register_type(record.descriptor());
        let mut buf = Vec::new();
        record.encode(&mut buf);
        self.group(type_id, &buf)
    }
}
