//! Memory observation for tracespy
//!
//! Tracks the byte ranges an intercepted call touches and turns them into
//! content-addressed resources and observation records:
//!
//! - IntervalSet: merge-on-insert pending ranges for one call
//! - SeenResources: capture-wide digest set, each resource emitted once
//! - Resource / MemoryObservation: the records written to the stream
//! - MemorySource: where observed bytes are read from
//! - CallObserver: the per-call recording window

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod intervals;
pub mod memory;
pub mod observer;
pub mod records;
pub mod seen;

pub use config::{ObserverConfig, ObserverConfigError};
pub use intervals::IntervalSet;
pub use memory::{BufferMemory, MemorySource, ProcessMemory};
pub use observer::CallObserver;
pub use records::{MemoryObservation, Resource};
pub use seen::SeenResources;
