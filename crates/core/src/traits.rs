//! Trait definitions at the pipeline's seams.

use crate::descriptor::TypeDescriptor;

/// A record that can be framed into a capture stream.
///
/// Interceptors implement this for their command and state records; the
/// pipeline implements it for resources and observations. The encoder keys
/// type registration on the descriptor, never on the Rust type.
pub trait Encodable: Send + Sync {
    /// Structural description of this record's type.
    fn descriptor(&self) -> &TypeDescriptor;

    /// Append this record's message bytes to `out`.
    fn encode(&self, out: &mut Vec<u8>);
}

/// Destination byte stream for a capture (socket, pipe, file).
///
/// The pipeline only ever writes; a return value smaller than `buf.len()`
/// means the sink is broken.
pub trait ByteSink: Send {
    /// Write `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> usize;
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}
