//! Capture session.
//!
//! One session per capture stream. Interceptors hold it (behind an `Arc`)
//! and bracket every intercepted call with [`CaptureSession::begin_call`].
//! The suspend gate and the API watch list are checked there, before any
//! observation work happens: an untraced call gets an observer backed by
//! the null encoder, which records nothing.

use crate::config::CaptureConfig;
use crate::sink::IoSink;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracespy_core::{ByteSink, Error, Result};
use tracespy_observe::{CallObserver, MemorySource, SeenResources};
use tracespy_state::{PoolArena, SnapshotStats, StateObject, StateSerializer};
use tracespy_wire::{Encoder, NullEncoder, PackEncoder, WriterCounters};
use tracing::info;
use uuid::Uuid;

/// Root context of one capture.
pub struct CaptureSession {
    id: Uuid,
    config: CaptureConfig,
    root: Arc<PackEncoder>,
    disabled: Arc<dyn Encoder>,
    resources: Arc<SeenResources>,
    arena: Arc<PoolArena>,
    watched: Option<FxHashSet<u8>>,
    suspended: AtomicBool,
    /// Calls begun, traced or not
    calls: AtomicU64,
    traced_calls: AtomicU64,
}

impl CaptureSession {
    /// Open a capture on `sink`. The stream header is written immediately.
    pub fn open(sink: Box<dyn ByteSink>, config: CaptureConfig) -> Result<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        let root = Arc::new(PackEncoder::new(sink, &config.writer));
        let watched = config
            .watched_apis
            .as_ref()
            .map(|apis| apis.iter().copied().collect());

        info!(
            session = %id,
            buffered = config.writer.buffered,
            suspended = config.start_suspended,
            "Opened capture session"
        );

        Ok(CaptureSession {
            id,
            suspended: AtomicBool::new(config.start_suspended),
            config,
            root,
            disabled: Arc::new(NullEncoder),
            resources: Arc::new(SeenResources::new()),
            arena: Arc::new(PoolArena::new()),
            watched,
            calls: AtomicU64::new(0),
            traced_calls: AtomicU64::new(0),
        })
    }

    /// Open a capture written to a new file at `path`.
    pub fn create_file(path: &Path, config: CaptureConfig) -> Result<Self> {
        let sink = IoSink::create(path).map_err(Error::IoError)?;
        Self::open(Box::new(sink), config)
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration the session was opened with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// True if calls to `api` are currently traced.
    pub fn is_tracing(&self, api: u8) -> bool {
        if self.is_suspended() {
            return false;
        }
        match &self.watched {
            Some(apis) => apis.contains(&api),
            None => true,
        }
    }

    /// Start observing an intercepted call to `api`.
    ///
    /// `memory` is the address space the call's pointers refer to.
    pub fn begin_call(&self, api: u8, memory: Arc<dyn MemorySource>) -> CallObserver {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let encoder = if self.is_tracing(api) {
            self.traced_calls.fetch_add(1, Ordering::Relaxed);
            self.encoder()
        } else {
            Arc::clone(&self.disabled)
        };
        let mut observer = CallObserver::new(
            encoder,
            Arc::clone(&self.resources),
            memory,
            &self.config.observer,
        );
        observer.begin(api);
        observer
    }

    /// Stop tracing. Calls begun while suspended record nothing.
    pub fn suspend(&self) {
        if !self.suspended.swap(true, Ordering::SeqCst) {
            info!(session = %self.id, "Capture suspended");
        }
    }

    /// Resume tracing.
    pub fn resume(&self) {
        if self.suspended.swap(false, Ordering::SeqCst) {
            info!(session = %self.id, "Capture resumed");
        }
    }

    /// True while tracing is suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Write a snapshot of `root` and the pools it references.
    pub fn snapshot<F>(&self, root: &dyn StateObject, buffers: F) -> SnapshotStats
    where
        F: FnOnce(&mut StateSerializer),
    {
        let mut serializer = StateSerializer::new(
            self.encoder(),
            Arc::clone(&self.resources),
            Arc::clone(&self.arena),
        );
        serializer.encode_state(root, buffers)
    }

    /// Root encoder, for interceptors that write records outside a call.
    pub fn encoder(&self) -> Arc<dyn Encoder> {
        Arc::clone(&self.root) as Arc<dyn Encoder>
    }

    /// Capture-wide resource set.
    pub fn resources(&self) -> &Arc<SeenResources> {
        &self.resources
    }

    /// Pool arena.
    pub fn arena(&self) -> &Arc<PoolArena> {
        &self.arena
    }

    /// Push buffered chunks to the sink. Returns sink health.
    pub fn flush(&self) -> bool {
        self.root.flush()
    }

    /// False once the sink has failed.
    pub fn is_healthy(&self) -> bool {
        self.root.is_healthy()
    }

    /// Writer counters.
    pub fn counters(&self) -> WriterCounters {
        self.root.counters()
    }

    /// Chunks written so far.
    pub fn chunk_count(&self) -> u64 {
        self.root.chunk_count()
    }

    /// Calls begun so far, and how many of them were traced.
    pub fn call_counts(&self) -> (u64, u64) {
        (
            self.calls.load(Ordering::Relaxed),
            self.traced_calls.load(Ordering::Relaxed),
        )
    }

    /// Flush and close the session.
    pub fn close(self) -> WriterCounters {
        self.flush();
        self.counters()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let healthy = self.root.flush();
        let (calls, traced) = self.call_counts();
        info!(
            session = %self.id,
            healthy,
            calls,
            traced,
            chunks = self.root.chunk_count(),
            resources = self.resources.len(),
            "Closed capture session"
        );
    }
}
