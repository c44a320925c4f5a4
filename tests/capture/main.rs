//! Integration tests for the capture pipeline.
//!
//! These drive the public API end to end (session, observer, encoder,
//! serializer) and check the resulting stream with the test decoder. Unit
//! tests in each crate cover the pieces in isolation.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod config_file;
mod disabled_tracing;
mod end_to_end;
mod resource_dedup;
mod state_snapshot;
mod sticky_failure;
