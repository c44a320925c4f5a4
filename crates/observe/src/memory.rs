//! Memory sources observed bytes are read from.

use parking_lot::RwLock;
use std::sync::Arc;
use tracespy_core::{Interval, PoolId};

/// An address space the observer can copy bytes out of.
pub trait MemorySource: Send + Sync {
    /// Pool the addresses belong to.
    fn pool(&self) -> PoolId;

    /// Copy the bytes of `range`.
    ///
    /// # Panics
    ///
    /// Implementations panic if `range` lies outside the source.
    fn read(&self, range: Interval) -> Vec<u8>;
}

/// The traced application's own address space.
#[derive(Debug)]
pub struct ProcessMemory {
    _private: (),
}

impl ProcessMemory {
    /// Create a source over raw process addresses.
    ///
    /// # Safety
    ///
    /// Every interval later passed to [`MemorySource::read`] must be
    /// readable memory of this process for the duration of the read. The
    /// interceptor upholds this by only observing pointers the intercepted
    /// call itself dereferences.
    pub unsafe fn new() -> Self {
        ProcessMemory { _private: () }
    }
}

impl MemorySource for ProcessMemory {
    fn pool(&self) -> PoolId {
        PoolId::APPLICATION
    }

    fn read(&self, range: Interval) -> Vec<u8> {
        if range.is_empty() {
            return Vec::new();
        }
        // SAFETY: guaranteed by the contract of `ProcessMemory::new`.
        unsafe { std::slice::from_raw_parts(range.start as *const u8, range.len() as usize) }
            .to_vec()
    }
}

/// A byte buffer mapped at a base address.
///
/// Stands in for pool memory and for application memory in tests. Clones
/// share the same bytes.
#[derive(Debug, Clone)]
pub struct BufferMemory {
    pool: PoolId,
    base: u64,
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl BufferMemory {
    /// Map `bytes` at `base` in `pool`.
    pub fn new(pool: PoolId, base: u64, bytes: Vec<u8>) -> Self {
        BufferMemory {
            pool,
            base,
            bytes: Arc::new(RwLock::new(bytes)),
        }
    }

    /// A zero-filled buffer of `size` bytes at offset 0 of `pool`.
    pub fn zeroed(pool: PoolId, size: usize) -> Self {
        Self::new(pool, 0, vec![0; size])
    }

    /// Range covered by the buffer.
    pub fn extent(&self) -> Interval {
        Interval::from_base_size(self.base, self.bytes.read().len() as u64)
    }

    /// Overwrite bytes starting at `addr`.
    ///
    /// # Panics
    ///
    /// Panics if the write runs outside the buffer.
    pub fn store(&self, addr: u64, data: &[u8]) {
        let range = Interval::from_base_size(addr, data.len() as u64);
        let offset = self.offset_of(range);
        self.bytes.write()[offset..offset + data.len()].copy_from_slice(data);
    }

    fn offset_of(&self, range: Interval) -> usize {
        let extent = self.extent();
        assert!(
            range.start >= extent.start && range.end <= extent.end,
            "range {} outside {} of {}",
            range,
            extent,
            self.pool
        );
        (range.start - self.base) as usize
    }
}

impl MemorySource for BufferMemory {
    fn pool(&self) -> PoolId {
        self.pool
    }

    fn read(&self, range: Interval) -> Vec<u8> {
        let offset = self.offset_of(range);
        self.bytes.read()[offset..offset + range.len() as usize].to_vec()
    }
}
