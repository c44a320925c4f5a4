//! Decoding errors for capture streams.
//!
//! The encoder never produces these; they come out of the stream decoder in
//! [`crate::testing`] and the header parser.

use tracespy_core::Error;

/// Errors found while decoding a capture stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The stream does not start with a known header.
    #[error("Unrecognized stream header")]
    BadHeader,

    /// The header names a protocol revision this decoder does not speak.
    #[error("Unsupported protocol version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version from the header
        major: u64,
        /// Minor version from the header
        minor: u64,
    },

    /// A varint ran past the end of the input or overflowed.
    #[error("offset {offset}: truncated or invalid varint")]
    BadVarint {
        /// Byte offset of the varint
        offset: usize,
    },

    /// A chunk declared more bytes than remain.
    #[error("offset {offset}: chunk needs {needed} bytes, {have} available")]
    TruncatedChunk {
        /// Byte offset of the chunk
        offset: usize,
        /// Declared payload size
        needed: usize,
        /// Bytes remaining
        have: usize,
    },

    /// An object references a type that was never defined.
    #[error("offset {offset}: unknown type tag {tag}")]
    UnknownType {
        /// Byte offset of the chunk
        offset: usize,
        /// Type tag as read from the wire
        tag: i64,
    },

    /// A parent delta resolves to a chunk that does not exist yet.
    #[error("offset {offset}: parent delta {delta} does not resolve to an earlier chunk")]
    DanglingParent {
        /// Byte offset of the chunk
        offset: usize,
        /// Parent delta as read from the wire
        delta: i64,
    },

    /// A type name is not valid UTF-8.
    #[error("offset {offset}: type name is not valid UTF-8")]
    InvalidUtf8 {
        /// Byte offset of the chunk
        offset: usize,
    },

    /// A message field uses a wire type the decoder does not know.
    #[error("unsupported wire type {wire_type} for field {field}")]
    UnsupportedWireType {
        /// Field number
        field: u32,
        /// Wire type bits
        wire_type: u8,
    },
}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Error::Decode(e.to_string())
    }
}
