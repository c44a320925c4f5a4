//! Stream header.
//!
//! Every capture stream opens with a fixed literal so a reading peer can
//! identify the framing before the first chunk arrives.
//!
//! ```text
//! 2.0:     "ProtoPack\r\n2.0\n"
//! legacy:  "protopack" varint(major) varint(minor)
//! ```
//!
//! The legacy revisions frame chunks differently. They are recognized here
//! so a decoder can report them, but nothing in this crate writes chunks in
//! the legacy framing.

use crate::error::WireError;
use crate::varint::{decode_u64, encode_u64};

/// Header literal for the 2.0 framing.
pub const HEADER_V2: &[u8; 15] = b"ProtoPack\r\n2.0\n";

/// Magic prefix of the legacy headers.
pub const LEGACY_MAGIC: &[u8; 9] = b"protopack";

/// A parsed or to-be-written stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Parent-delta framing with inline type definitions.
    V2,
    /// Older revisions identified by version varints.
    Legacy {
        /// Major version
        major: u64,
        /// Minor version
        minor: u64,
    },
}

impl Header {
    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Header::V2 => HEADER_V2.to_vec(),
            Header::Legacy { major, minor } => {
                let mut bytes = LEGACY_MAGIC.to_vec();
                encode_u64(*major, &mut bytes);
                encode_u64(*minor, &mut bytes);
                bytes
            }
        }
    }

    /// Parse a header from the start of `data`, returning it and its length.
    pub fn parse(data: &[u8]) -> Result<(Header, usize), WireError> {
        if data.starts_with(HEADER_V2) {
            return Ok((Header::V2, HEADER_V2.len()));
        }
        if data.starts_with(LEGACY_MAGIC) {
            let mut pos = LEGACY_MAGIC.len();
            let (major, n) =
                decode_u64(&data[pos..]).ok_or(WireError::BadVarint { offset: pos })?;
            pos += n;
            let (minor, n) =
                decode_u64(&data[pos..]).ok_or(WireError::BadVarint { offset: pos })?;
            pos += n;
            return Ok((Header::Legacy { major, minor }, pos));
        }
        Err(WireError::BadHeader)
    }

    /// True for the framing this crate encodes.
    pub fn is_current(&self) -> bool {
        matches!(self, Header::V2)
    }
}
