//! Core types and traits for tracespy
//!
//! This crate defines the foundational types shared by every layer of the
//! capture pipeline:
//! - Interval: half-open byte range touched by an intercepted call
//! - ResourceId: content digest identifying a deduplicated blob
//! - PoolId / TypeId / ChunkId: numeric identities assigned by the pipeline
//! - TypeDescriptor: structural description of a record type
//! - Encodable / ByteSink: the seams between interceptors, encoder and transport
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod error;
pub mod traits;
pub mod types;

pub use descriptor::{FieldDescriptor, FieldKind, TypeDescriptor};
pub use error::{Error, Result};
pub use traits::{ByteSink, Encodable};
pub use types::{ChunkId, Interval, PoolId, ResourceId, TypeId, RESOURCE_ID_LEN};
