//! Memory pool arena.
//!
//! Pools are addressed by id and reference-counted explicitly: `create`
//! hands out one reference, `retain` adds one, `release` drops one and
//! frees the pool at zero. Ids come from a monotonic counter and are never
//! reused, so a stale id can only ever miss.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracespy_core::{Interval, PoolId};
use tracespy_observe::{BufferMemory, MemorySource};
use tracing::debug;

/// View of one pool's memory. Clones share the same bytes.
#[derive(Debug, Clone)]
pub struct PoolMemory {
    id: PoolId,
    size: u64,
    /// `None` for virtual pools
    backing: Option<BufferMemory>,
}

impl PoolMemory {
    /// Pool id.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// True if the pool has identity but no memory.
    pub fn is_virtual(&self) -> bool {
        self.backing.is_none()
    }

    /// Whole-pool range, in pool offsets.
    pub fn extent(&self) -> Interval {
        Interval::new(0, self.size)
    }

    /// Copy of the pool's bytes; `None` for virtual pools.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.backing.as_ref().map(|b| b.read(self.extent()))
    }

    /// Overwrite bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics on a virtual pool or a write past the end.
    pub fn store(&self, offset: u64, data: &[u8]) {
        match &self.backing {
            Some(b) => b.store(offset, data),
            None => panic!("{} is virtual and has no memory", self.id),
        }
    }
}

impl MemorySource for PoolMemory {
    fn pool(&self) -> PoolId {
        self.id
    }

    fn read(&self, range: Interval) -> Vec<u8> {
        match &self.backing {
            Some(b) => b.read(range),
            None => panic!("{} is virtual and has no memory", self.id),
        }
    }
}

struct PoolEntry {
    memory: PoolMemory,
    refs: u32,
}

/// Arena of live pools.
pub struct PoolArena {
    next_id: AtomicU32,
    pools: Mutex<FxHashMap<PoolId, PoolEntry>>,
}

impl Default for PoolArena {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolArena {
    /// Create an empty arena. The first pool gets id 1.
    pub fn new() -> Self {
        PoolArena {
            next_id: AtomicU32::new(1),
            pools: Mutex::new(FxHashMap::default()),
        }
    }

    fn insert(&self, size: u64, backing: impl FnOnce(PoolId) -> Option<BufferMemory>) -> PoolId {
        let id = PoolId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let memory = PoolMemory {
            id,
            size,
            backing: backing(id),
        };
        debug!(pool = id.0, size, is_virtual = memory.is_virtual(), "Created pool");
        self.pools.lock().insert(id, PoolEntry { memory, refs: 1 });
        id
    }

    /// Create a zero-filled pool of `size` bytes.
    pub fn create(&self, size: u64) -> PoolId {
        self.insert(size, |id| Some(BufferMemory::zeroed(id, size as usize)))
    }

    /// Create a pool holding `bytes`.
    pub fn adopt(&self, bytes: Vec<u8>) -> PoolId {
        let size = bytes.len() as u64;
        self.insert(size, move |id| Some(BufferMemory::new(id, 0, bytes)))
    }

    /// Create a pool with identity but no memory.
    pub fn create_virtual(&self, size: u64) -> PoolId {
        self.insert(size, |_| None)
    }

    /// Add a reference.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not live.
    pub fn retain(&self, id: PoolId) {
        let mut pools = self.pools.lock();
        match pools.get_mut(&id) {
            Some(entry) => entry.refs += 1,
            None => panic!("retain of dead {}", id),
        }
    }

    /// Drop a reference, freeing the pool at zero. Returns whether it was
    /// freed.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not live.
    pub fn release(&self, id: PoolId) -> bool {
        let mut pools = self.pools.lock();
        let entry = match pools.get_mut(&id) {
            Some(entry) => entry,
            None => panic!("release of dead {}", id),
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }
        pools.remove(&id);
        debug!(pool = id.0, "Freed pool");
        true
    }

    /// Memory view of a live pool.
    pub fn memory(&self, id: PoolId) -> Option<PoolMemory> {
        self.pools.lock().get(&id).map(|e| e.memory.clone())
    }

    /// Reference count of a live pool.
    pub fn refs(&self, id: PoolId) -> Option<u32> {
        self.pools.lock().get(&id).map(|e| e.refs)
    }

    /// True if the pool is live.
    pub fn contains(&self, id: PoolId) -> bool {
        self.pools.lock().contains_key(&id)
    }

    /// Number of live pools.
    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    /// True if no pool is live.
    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }
}
