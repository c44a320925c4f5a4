//! State snapshots for tracespy
//!
//! - PoolArena: ref-counted memory pools, real or virtual
//! - StateSerializer: writes one snapshot of a live object graph plus the
//!   contents of every pool it references
//! - StateObject / SerializeContext: how graph nodes describe themselves,
//!   with shared sub-objects written once and referenced by id afterwards

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pool;
pub mod records;
pub mod serializer;

pub use pool::{PoolArena, PoolMemory};
pub use records::{reference_type, GlobalStateBegin, Slice};
pub use serializer::{SerializeContext, SnapshotStats, StateObject, StateSerializer};
