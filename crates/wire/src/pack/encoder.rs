//! Chunk-framing encoder.
//!
//! One [`PackEncoder`] root owns a capture stream. Groups opened from it
//! (and from its groups) are further `PackEncoder`s sharing the same
//! [`SharedState`] through an `Arc`, so every encoder writes through the
//! same writer, type table and chunk counter, and the state lives as long
//! as its longest holder.
//!
//! All framing happens under one mutex: a chunk is composed, handed to the
//! writer and numbered inside the same critical section, so chunk numbers
//! follow the order bytes reach the sink.
//!
//! Writer health is mirrored in an atomic flag so callers can stop
//! producing records once the sink has failed without taking the lock.

use super::registry::{TypeCaches, TypeTable};
use super::{group_tag, object_tag, Encoder, GROUP_END_TAG};
use crate::chunk::{ChunkWriter, FlushMode, WriterConfig, WriterCounters};
use crate::header::Header;
use crate::message::encode_descriptor;
use crate::varint::{encode_i64, encode_u64};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracespy_core::{ByteSink, ChunkId, TypeDescriptor, TypeId};
use tracing::{debug, trace};

/// Everything behind the global emission lock.
struct EmitState {
    writer: ChunkWriter,
    types: TypeTable,
    /// Number of the most recent object or group opening (0 = none yet)
    last_chunk_id: u64,
    /// Chunks of every kind handed to the writer
    chunks: u64,
    /// Reused buffer for chunk prefixes
    scratch: Vec<u8>,
}

impl EmitState {
    /// Frame a type-definition chunk.
    fn write_type_definition(&mut self, id: TypeId, desc: &TypeDescriptor) {
        if !self.writer.is_healthy() {
            return;
        }
        let descriptor = encode_descriptor(desc);
        let name = desc.name().as_bytes();

        let mut name_len = Vec::with_capacity(2);
        encode_u64(name.len() as u64, &mut name_len);
        let size = name_len.len() + name.len() + descriptor.len();

        self.scratch.clear();
        encode_i64(-(size as i64), &mut self.scratch);
        self.writer.write(&[
            self.scratch.as_slice(),
            name_len.as_slice(),
            name,
            descriptor.as_slice(),
        ]);
        self.chunks += 1;

        debug!(name = desc.name(), id = id.0, "Registered capture type");
    }

    /// Register `desc`, writing definition chunks for anything new.
    fn register(&mut self, desc: &TypeDescriptor) -> (TypeId, bool) {
        let mut pending: Vec<(TypeId, TypeDescriptor)> = Vec::new();
        let result = self
            .types
            .register(desc, &mut |id, d| pending.push((id, d.clone())));
        for (id, d) in &pending {
            self.write_type_definition(*id, d);
        }
        result
    }

    /// Frame an object, group opening or group end under `parent`.
    ///
    /// Returns the number assigned to the chunk, or `None` for group ends
    /// and when the writer is unhealthy.
    fn write_object(&mut self, parent: ChunkId, tag: i64, message: &[u8]) -> Option<ChunkId> {
        if !self.writer.is_healthy() {
            return None;
        }

        let delta = if parent.is_root() {
            0
        } else {
            (self.last_chunk_id + 1 - parent.0) as i64
        };

        let mut header = Vec::with_capacity(4);
        encode_i64(delta, &mut header);
        encode_i64(tag, &mut header);
        let size = header.len() + message.len();

        self.scratch.clear();
        encode_i64(size as i64, &mut self.scratch);
        self.writer
            .write(&[self.scratch.as_slice(), header.as_slice(), message]);
        self.chunks += 1;

        if tag == GROUP_END_TAG {
            trace!(group = parent.0, "Closed group");
            return None;
        }
        self.last_chunk_id += 1;
        trace!(
            chunk = self.last_chunk_id,
            parent = parent.0,
            tag,
            size,
            "Emitted chunk"
        );
        Some(ChunkId(self.last_chunk_id))
    }
}

/// State shared by a root encoder and all of its groups.
pub struct SharedState {
    emit: Mutex<EmitState>,
    caches: TypeCaches,
    /// False once the writer has failed; only ever goes false
    healthy: AtomicBool,
}

impl SharedState {
    /// Run `f` under the emission lock, then publish the writer's health.
    fn with_emit<R>(&self, f: impl FnOnce(&mut EmitState) -> R) -> R {
        let mut state = self.emit.lock();
        let result = f(&mut state);
        self.publish_health(&state);
        result
    }

    fn publish_health(&self, state: &EmitState) {
        if !state.writer.is_healthy() {
            self.healthy.store(false, Ordering::Release);
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }
}

/// Encoder that frames records into the chunk stream.
pub struct PackEncoder {
    shared: Arc<SharedState>,
    /// Opening chunk of this group; `None` for the root and for groups
    /// that could not be opened.
    group: Option<ChunkId>,
    root: bool,
}

impl PackEncoder {
    /// Create the root encoder for a new stream on `sink`.
    ///
    /// The header is written and flushed straight away, whatever the
    /// buffering configuration, so the reading peer is never left waiting
    /// on the handshake.
    pub fn new(sink: Box<dyn ByteSink>, config: &WriterConfig) -> Self {
        let mut writer = ChunkWriter::new(sink, FlushMode::Immediate);
        writer.write(&[Header::V2.to_bytes().as_slice()]);
        writer.set_mode(config.flush_mode());
        let healthy = AtomicBool::new(writer.is_healthy());

        let shared = SharedState {
            emit: Mutex::new(EmitState {
                writer,
                types: TypeTable::new(),
                last_chunk_id: 0,
                chunks: 0,
                scratch: Vec::with_capacity(16),
            }),
            caches: TypeCaches::new(config.type_cache_shards),
            healthy,
        };

        PackEncoder {
            shared: Arc::new(shared),
            group: None,
            root: true,
        }
    }

    /// Parent for chunks written through this encoder.
    fn parent(&self) -> ChunkId {
        self.group.unwrap_or(ChunkId::ROOT)
    }

    fn child(&self, group: Option<ChunkId>) -> PackEncoder {
        PackEncoder {
            shared: Arc::clone(&self.shared),
            group,
            root: false,
        }
    }

    /// Open a group, returning the concrete encoder type.
    pub fn begin_group(&self, type_id: TypeId, message: &[u8]) -> PackEncoder {
        let parent = self.parent();
        let id = self
            .shared
            .with_emit(|state| state.write_object(parent, group_tag(type_id), message));
        self.child(id)
    }

    /// True for the encoder that created the stream.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Opening chunk of this group.
    pub fn group_id(&self) -> Option<ChunkId> {
        self.group
    }

    /// False once the sink has failed.
    pub fn is_healthy(&self) -> bool {
        self.shared.is_healthy()
    }

    /// Number of the most recent object or group opening.
    pub fn last_chunk_id(&self) -> ChunkId {
        ChunkId(self.shared.emit.lock().last_chunk_id)
    }

    /// Chunks of every kind written so far.
    pub fn chunk_count(&self) -> u64 {
        self.shared.emit.lock().chunks
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.shared.emit.lock().types.len()
    }

    /// Writer counters.
    pub fn counters(&self) -> WriterCounters {
        self.shared.emit.lock().writer.counters()
    }
}

impl Encoder for PackEncoder {
    fn register_type(&self, desc: &TypeDescriptor) -> (TypeId, bool) {
        let mut cache = self.shared.caches.try_acquire();
        if let Some(ids) = cache.as_ref() {
            if let Some(&id) = ids.get(desc.name()) {
                return (id, false);
            }
        }

        let (id, is_new) = self.shared.with_emit(|state| state.register(desc));

        if let Some(ids) = cache.as_mut() {
            ids.insert(desc.name().to_string(), id);
        }
        (id, is_new)
    }

    fn object(&self, type_id: TypeId, message: &[u8]) {
        let parent = self.parent();
        self.shared
            .with_emit(|state| state.write_object(parent, object_tag(type_id), message));
    }

    fn group(&self, type_id: TypeId, message: &[u8]) -> Box<dyn Encoder> {
        Box::new(self.begin_group(type_id, message))
    }

    fn flush(&self) -> bool {
        self.shared.with_emit(|state| state.writer.flush())
    }

    /// False once the sink has failed, so callers can skip building
    /// records that would be dropped.
    fn is_enabled(&self) -> bool {
        self.shared.is_healthy()
    }
}

impl Drop for PackEncoder {
    fn drop(&mut self) {
        if let Some(group) = self.group {
            self.shared
                .with_emit(|state| state.write_object(group, GROUP_END_TAG, &[]));
        }
    }
}
