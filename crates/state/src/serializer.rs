//! State snapshot serialization.
//!
//! A snapshot is written as:
//!
//! ```text
//! GlobalStateBegin
//! (pools created while preparing buffers: Resource? MemoryObservation)*
//! <root object>
//! (every other pool the root touched: Resource? MemoryObservation)*
//! ```
//!
//! Each pool is observed at most once per snapshot. Objects reached
//! through [`SerializeContext::reference`] are written in full the first
//! time and by id afterwards; reference ids restart with every snapshot, so
//! each snapshot can be decoded on its own.

use crate::pool::{PoolArena, PoolMemory};
use crate::records::{GlobalStateBegin, Slice};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracespy_core::{Interval, PoolId, ResourceId, TypeDescriptor};
use tracespy_observe::{MemoryObservation, Resource, SeenResources};
use tracespy_wire::{Encoder, MessageWriter};
use tracing::{debug, info, warn};

/// A node of the live state graph.
pub trait StateObject: Send + Sync {
    /// Structural type of this node. Fields holding references to other
    /// nodes are declared with [`reference_type`](crate::reference_type).
    fn descriptor(&self) -> &TypeDescriptor;

    /// Append this node's message bytes to `out`.
    fn serialize(&self, ctx: &mut SerializeContext<'_>, out: &mut Vec<u8>);
}

/// Pools touched by the object graph, in first-touch order.
#[derive(Debug, Default)]
struct Touched {
    order: Vec<PoolId>,
    set: FxHashSet<PoolId>,
}

impl Touched {
    fn touch(&mut self, pool: PoolId) {
        if !pool.is_application() && self.set.insert(pool) {
            self.order.push(pool);
        }
    }
}

/// A referenced object and the id it was written under. The object is held
/// so its address cannot be reused while the snapshot is being written.
struct Reference {
    id: u64,
    _target: Arc<dyn StateObject>,
}

/// Serialization state handed to [`StateObject::serialize`].
pub struct SerializeContext<'s> {
    arena: &'s PoolArena,
    /// Object address -> reference
    references: &'s mut FxHashMap<usize, Reference>,
    touched: &'s mut Touched,
}

impl SerializeContext<'_> {
    /// Write a reference to `target` as field `field`.
    ///
    /// The first reference to an object carries its value; later ones carry
    /// only the id. Cycles terminate because the id is assigned before the
    /// value is written.
    pub fn reference(&mut self, out: &mut Vec<u8>, field: u32, target: &Arc<dyn StateObject>) {
        let key = Arc::as_ptr(target) as *const () as usize;
        let mut body = Vec::new();
        match self.references.get(&key).map(|r| r.id) {
            Some(id) => {
                MessageWriter::new(&mut body).uint(1, id);
            }
            None => {
                let id = self.references.len() as u64 + 1;
                self.references.insert(
                    key,
                    Reference {
                        id,
                        _target: Arc::clone(target),
                    },
                );
                let mut value = Vec::new();
                target.serialize(self, &mut value);
                MessageWriter::new(&mut body).uint(1, id).bytes(2, &value);
            }
        }
        MessageWriter::new(out).bytes(field, &body);
    }

    /// Write `value` inline as field `field`, without deduplication.
    pub fn nested(&mut self, out: &mut Vec<u8>, field: u32, value: &dyn StateObject) {
        let mut body = Vec::new();
        value.serialize(self, &mut body);
        MessageWriter::new(out).bytes(field, &body);
    }

    /// Write a pool slice as field `field` and mark its pool touched.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not live or the slice runs past its end.
    pub fn slice(&mut self, out: &mut Vec<u8>, field: u32, slice: Slice) {
        if !slice.pool.is_application() {
            let size = match self.arena.memory(slice.pool) {
                Some(memory) => memory.size(),
                None => panic!("slice of dead {}", slice.pool),
            };
            let range = Interval::from_base_size(slice.base, slice.size);
            assert!(
                range.end <= size,
                "slice {} outside {} of {} bytes",
                range,
                slice.pool,
                size
            );
        }
        self.touched.touch(slice.pool);
        MessageWriter::new(out).message(field, &slice);
    }

    /// Mark `pool` as referenced by the snapshot.
    pub fn touch_pool(&mut self, pool: PoolId) {
        self.touched.touch(pool);
    }
}

/// Counts from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    /// Distinct objects written through references
    pub references: usize,
    /// Pools observed after the root object
    pub pools_observed: usize,
    /// Pools created while preparing buffers
    pub pools_created: usize,
}

/// Writes snapshots of live state through an encoder.
///
/// A serializer may write any number of snapshots. Pools seen, reference
/// ids and stand-in pools belong to one snapshot; only the empty resource
/// is remembered across them.
pub struct StateSerializer {
    encoder: Arc<dyn Encoder>,
    resources: Arc<SeenResources>,
    arena: Arc<PoolArena>,
    /// Pools observed in the current snapshot
    seen_pools: FxHashSet<PoolId>,
    touched: Touched,
    references: FxHashMap<usize, Reference>,
    /// Pools created by `create_pool` for the current snapshot
    stand_ins: Vec<PoolId>,
    /// Stand-ins of the previous snapshot, released when the next one
    /// starts or on drop
    retired: Vec<PoolId>,
    empty_resource: Option<ResourceId>,
}

impl StateSerializer {
    /// Create a serializer writing through `encoder`.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        resources: Arc<SeenResources>,
        arena: Arc<PoolArena>,
    ) -> Self {
        StateSerializer {
            encoder,
            resources,
            arena,
            seen_pools: FxHashSet::default(),
            touched: Touched::default(),
            references: FxHashMap::default(),
            stand_ins: Vec::new(),
            retired: Vec::new(),
            empty_resource: None,
        }
    }

    /// Write one snapshot of `root`.
    ///
    /// `buffers` runs after the begin marker and before `root` is
    /// serialized; it prepares whatever pools the graph needs, typically
    /// with [`create_pool`](Self::create_pool).
    pub fn encode_state<F>(&mut self, root: &dyn StateObject, buffers: F) -> SnapshotStats
    where
        F: FnOnce(&mut StateSerializer),
    {
        let retired = std::mem::take(&mut self.retired);
        self.release(retired);

        let root_name = root.descriptor().name().to_string();
        self.encoder.message(&GlobalStateBegin {
            root: root_name.clone(),
        });

        let created_before = self.stand_ins.len();
        buffers(self);

        let (type_id, _) = self.encoder.register_type(root.descriptor());
        let mut out = Vec::new();
        {
            let mut ctx = SerializeContext {
                arena: &self.arena,
                references: &mut self.references,
                touched: &mut self.touched,
            };
            root.serialize(&mut ctx, &mut out);
        }
        self.encoder.object(type_id, &out);

        let touched = std::mem::take(&mut self.touched);
        let mut pools_observed = 0;
        for pool in touched.order {
            if self.seen_pools.insert(pool) {
                self.observe_pool(pool);
                pools_observed += 1;
            }
        }

        let stats = SnapshotStats {
            references: self.references.len(),
            pools_observed,
            pools_created: self.stand_ins.len() - created_before,
        };

        self.references.clear();
        self.seen_pools.clear();
        self.retired = std::mem::take(&mut self.stand_ins);

        info!(
            root = %root_name,
            references = stats.references,
            pools_observed = stats.pools_observed,
            pools_created = stats.pools_created,
            "Encoded state snapshot"
        );
        stats
    }

    /// Create a pool for the snapshot and observe it immediately.
    ///
    /// With `init`, the pool is backed by `size` zeroed bytes that `init`
    /// fills in, and its contents are observed. Without, the pool is
    /// virtual and observed as the empty placeholder resource. Either way
    /// the pool is not observed again in this snapshot. It stays live until
    /// the next snapshot starts or the serializer is dropped.
    pub fn create_pool(&mut self, size: u64, init: Option<&mut dyn FnMut(&PoolMemory)>) -> PoolId {
        let id = match init {
            Some(init) => {
                let id = self.arena.create(size);
                if let Some(memory) = self.arena.memory(id) {
                    init(&memory);
                }
                id
            }
            None => self.arena.create_virtual(size),
        };
        self.seen_pools.insert(id);
        self.stand_ins.push(id);
        self.observe_pool(id);
        id
    }

    /// Mark `pool` as referenced by the snapshot being prepared.
    pub fn touch_pool(&mut self, pool: PoolId) {
        self.touched.touch(pool);
    }

    /// Arena pools are allocated from.
    pub fn arena(&self) -> &Arc<PoolArena> {
        &self.arena
    }

    fn release(&self, pools: Vec<PoolId>) {
        for pool in pools {
            if self.arena.contains(pool) {
                self.arena.release(pool);
            }
        }
    }

    fn observe_pool(&mut self, pool: PoolId) {
        // Nothing reaches the stream; skip the copy and the digest
        if !self.encoder.is_enabled() {
            return;
        }
        let memory = match self.arena.memory(pool) {
            Some(memory) => memory,
            None => {
                warn!(%pool, "Snapshot references a pool that no longer exists");
                return;
            }
        };

        let resource = match memory.contents() {
            Some(data) => {
                let id = ResourceId::for_content(&data);
                let encoder = &self.encoder;
                self.resources.insert_with(id, || {
                    encoder.message(&Resource { id, data });
                });
                id
            }
            None => self.empty_resource(),
        };

        self.encoder
            .message(&MemoryObservation::new(memory.extent(), pool, resource));
    }

    /// Identity of the zero-byte resource, written on first use.
    fn empty_resource(&mut self) -> ResourceId {
        if let Some(id) = self.empty_resource {
            return id;
        }
        let empty = Resource::new(Vec::new());
        let id = empty.id;
        let encoder = &self.encoder;
        self.resources.insert_with(id, || encoder.message(&empty));
        self.empty_resource = Some(id);
        id
    }
}

impl Drop for StateSerializer {
    fn drop(&mut self) {
        let mut pools = std::mem::take(&mut self.retired);
        pools.append(&mut self.stand_ins);
        if !pools.is_empty() {
            debug!(pools = pools.len(), "Released snapshot stand-in pools");
        }
        self.release(pools);
    }
}
