//! Structural type descriptors.
//!
//! A descriptor names a record type and lists its fields. Fields of message
//! kind point at the nested type's descriptor, so a registry can walk the
//! whole schema reachable from one record and define every piece of it
//! before the record itself appears in a stream.
//!
//! Descriptors are compared by name: two descriptors with the same fully
//! qualified name describe the same type for the life of a capture.

use std::sync::Arc;

/// Wire-level kind of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Unsigned varint
    UInt64,
    /// Zigzag-encoded signed varint
    SInt64,
    /// Boolean stored as a varint 0/1
    Bool,
    /// Length-delimited raw bytes
    Bytes,
    /// Length-delimited UTF-8
    String,
    /// Length-delimited nested message
    Message(Arc<TypeDescriptor>),
}

impl FieldKind {
    /// Stable numeric code written into type-definition chunks.
    pub fn code(&self) -> u8 {
        match self {
            FieldKind::UInt64 => 1,
            FieldKind::SInt64 => 2,
            FieldKind::Bool => 3,
            FieldKind::Bytes => 4,
            FieldKind::String => 5,
            FieldKind::Message(_) => 6,
        }
    }

    /// Nested descriptor for message fields.
    pub fn message(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            FieldKind::Message(desc) => Some(desc),
            _ => None,
        }
    }
}

/// One field of a record type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field number used as the tag on the wire
    pub number: u32,
    /// Field kind
    pub kind: FieldKind,
    /// Whether the field may repeat
    pub repeated: bool,
}

/// Structural description of a record type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Create a descriptor with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a singular field (builder pattern).
    pub fn with_field(mut self, name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            number,
            kind,
            repeated: false,
        });
        self
    }

    /// Add a repeated field (builder pattern).
    pub fn with_repeated_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        kind: FieldKind,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            number,
            kind,
            repeated: true,
        });
        self
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Directly nested message types, first occurrence of each name only.
    pub fn nested(&self) -> Vec<&Arc<TypeDescriptor>> {
        let mut out: Vec<&Arc<TypeDescriptor>> = Vec::new();
        for field in &self.fields {
            if let Some(desc) = field.kind.message() {
                if desc.name() != self.name && !out.iter().any(|d| d.name() == desc.name()) {
                    out.push(desc);
                }
            }
        }
        out
    }
}
