//! Capture stream decoder.

use crate::error::WireError;
use crate::header::Header;
use crate::message::{WIRE_LEN, WIRE_VARINT};
use crate::varint::{decode_i64, decode_u64};
use tracespy_core::{ChunkId, TypeId};

/// One decoded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A type definition.
    TypeDef {
        /// Id implied by definition order
        id: TypeId,
        /// Fully qualified type name
        name: String,
        /// Encoded descriptor
        descriptor: Vec<u8>,
    },
    /// A leaf object.
    Object {
        /// Number assigned in stream order
        id: ChunkId,
        /// Enclosing group, or root
        parent: ChunkId,
        /// Record type
        type_id: TypeId,
        /// Encoded record
        message: Vec<u8>,
    },
    /// The opening of a group.
    GroupOpen {
        /// Number assigned in stream order
        id: ChunkId,
        /// Enclosing group, or root
        parent: ChunkId,
        /// Record type
        type_id: TypeId,
        /// Encoded record
        message: Vec<u8>,
    },
    /// The end of a group.
    GroupEnd {
        /// The group being closed
        group: ChunkId,
    },
}

impl Chunk {
    /// Record type, for objects and group openings.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Chunk::Object { type_id, .. } | Chunk::GroupOpen { type_id, .. } => Some(*type_id),
            _ => None,
        }
    }

    /// Encoded record, for objects and group openings.
    pub fn message(&self) -> Option<&[u8]> {
        match self {
            Chunk::Object { message, .. } | Chunk::GroupOpen { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Enclosing group, for objects and group openings.
    pub fn parent(&self) -> Option<ChunkId> {
        match self {
            Chunk::Object { parent, .. } | Chunk::GroupOpen { parent, .. } => Some(*parent),
            _ => None,
        }
    }
}

/// Reads chunks off a complete capture stream.
///
/// Tracks type definitions and chunk numbering the way a replay peer
/// would, rejecting objects of undefined types and parents that do not
/// resolve to an earlier chunk. Iteration stops after the first error.
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
    types: Vec<String>,
    last_chunk_id: u64,
    failed: bool,
}

impl<'a> StreamReader<'a> {
    /// Parse the header and position the reader on the first chunk.
    pub fn new(data: &'a [u8]) -> Result<Self, WireError> {
        let (header, len) = Header::parse(data)?;
        if let Header::Legacy { major, minor } = header {
            return Err(WireError::UnsupportedVersion { major, minor });
        }
        Ok(StreamReader {
            data,
            pos: len,
            types: Vec::new(),
            last_chunk_id: 0,
            failed: false,
        })
    }

    /// Decode every chunk in `data`.
    pub fn read_all(data: &'a [u8]) -> Result<Vec<Chunk>, WireError> {
        StreamReader::new(data)?.collect()
    }

    /// Name of a type defined so far.
    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        self.types.get(id.0 as usize).map(String::as_str)
    }

    fn read_chunk(&mut self) -> Result<Chunk, WireError> {
        let data = self.data;
        let offset = self.pos;
        let (size, n) = decode_i64(&data[self.pos..]).ok_or(WireError::BadVarint { offset })?;
        self.pos += n;

        let len = size.unsigned_abs() as usize;
        let have = data.len() - self.pos;
        if len > have {
            return Err(WireError::TruncatedChunk {
                offset,
                needed: len,
                have,
            });
        }
        let payload = &data[self.pos..self.pos + len];
        self.pos += len;

        if size < 0 {
            self.type_definition(offset, payload)
        } else {
            self.object(offset, payload)
        }
    }

    fn type_definition(&mut self, offset: usize, payload: &[u8]) -> Result<Chunk, WireError> {
        let (name_len, n) = decode_u64(payload).ok_or(WireError::BadVarint { offset })?;
        let name_end = n
            .checked_add(name_len as usize)
            .filter(|&end| end <= payload.len())
            .ok_or(WireError::TruncatedChunk {
                offset,
                needed: name_len as usize,
                have: payload.len() - n,
            })?;
        let name = std::str::from_utf8(&payload[n..name_end])
            .map_err(|_| WireError::InvalidUtf8 { offset })?
            .to_string();

        let id = TypeId(self.types.len() as u64);
        self.types.push(name.clone());
        Ok(Chunk::TypeDef {
            id,
            name,
            descriptor: payload[name_end..].to_vec(),
        })
    }

    fn object(&mut self, offset: usize, payload: &[u8]) -> Result<Chunk, WireError> {
        let (delta, n) = decode_i64(payload).ok_or(WireError::BadVarint { offset })?;
        let (tag, m) = decode_i64(&payload[n..]).ok_or(WireError::BadVarint { offset })?;
        let message = &payload[n + m..];

        let parent = self.resolve_parent(offset, delta)?;

        if tag == 0 {
            if parent.is_root() {
                return Err(WireError::DanglingParent { offset, delta });
            }
            return Ok(Chunk::GroupEnd { group: parent });
        }

        let index = tag.unsigned_abs() - 1;
        if index as usize >= self.types.len() {
            return Err(WireError::UnknownType { offset, tag });
        }
        let type_id = TypeId(index);

        self.last_chunk_id += 1;
        let id = ChunkId(self.last_chunk_id);
        let message = message.to_vec();
        Ok(if tag > 0 {
            Chunk::Object {
                id,
                parent,
                type_id,
                message,
            }
        } else {
            Chunk::GroupOpen {
                id,
                parent,
                type_id,
                message,
            }
        })
    }

    fn resolve_parent(&self, offset: usize, delta: i64) -> Result<ChunkId, WireError> {
        if delta == 0 {
            return Ok(ChunkId::ROOT);
        }
        let next = self.last_chunk_id as i64 + 1;
        if delta < 0 || delta >= next {
            return Err(WireError::DanglingParent { offset, delta });
        }
        Ok(ChunkId((next - delta) as u64))
    }
}

impl Iterator for StreamReader<'_> {
    type Item = Result<Chunk, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let result = self.read_chunk();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// A decoded message field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Wire type 0
    Varint(u64),
    /// Wire type 2
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// The varint value, if this is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Varint(v) => Some(*v),
            FieldValue::Bytes(_) => None,
        }
    }

    /// The byte run, if this is one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            FieldValue::Varint(_) => None,
        }
    }
}

/// Split an encoded record into `(field number, value)` pairs, in order.
pub fn decode_fields(payload: &[u8]) -> Result<Vec<(u32, FieldValue)>, WireError> {
    let mut fields = Vec::new();
    let mut pos = 0;
    while pos < payload.len() {
        let (key, n) =
            decode_u64(&payload[pos..]).ok_or(WireError::BadVarint { offset: pos })?;
        pos += n;
        let field = (key >> 3) as u32;
        let wire_type = (key & 0x7) as u8;

        match wire_type {
            WIRE_VARINT => {
                let (v, n) =
                    decode_u64(&payload[pos..]).ok_or(WireError::BadVarint { offset: pos })?;
                pos += n;
                fields.push((field, FieldValue::Varint(v)));
            }
            WIRE_LEN => {
                let (len, n) =
                    decode_u64(&payload[pos..]).ok_or(WireError::BadVarint { offset: pos })?;
                pos += n;
                let len = len as usize;
                let have = payload.len() - pos;
                if len > have {
                    return Err(WireError::TruncatedChunk {
                        offset: pos,
                        needed: len,
                        have,
                    });
                }
                fields.push((field, FieldValue::Bytes(payload[pos..pos + len].to_vec())));
                pos += len;
            }
            _ => return Err(WireError::UnsupportedWireType { field, wire_type }),
        }
    }
    Ok(fields)
}
