//! Identifier and range types shared by every pipeline layer.

use sha1::{Digest, Sha1};
use std::fmt;

/// Width in bytes of a [`ResourceId`] digest.
pub const RESOURCE_ID_LEN: usize = 20;

/// Half-open byte range `[start, end)` over an address space.
///
/// The address space is either application memory or offsets into a pool;
/// the interval itself does not know which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    /// First byte in the range
    pub start: u64,
    /// One past the last byte in the range
    pub end: u64,
}

impl Interval {
    /// Create an interval.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`. A reversed range is a bug in the caller and
    /// must not reach the capture stream.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(
            start <= end,
            "interval end {:#x} precedes start {:#x}",
            end,
            start
        );
        Interval { start, end }
    }

    /// Create the interval `[base, base + size)`.
    ///
    /// # Panics
    ///
    /// Panics if `base + size` overflows the address space.
    pub fn from_base_size(base: u64, size: u64) -> Self {
        match base.checked_add(size) {
            Some(end) => Interval { start: base, end },
            None => panic!(
                "interval at {:#x} with size {} overflows the address space",
                base, size
            ),
        }
    }

    /// Number of bytes covered.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// True if the interval covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `addr` lies inside the interval.
    #[inline]
    pub fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr < self.end
    }

    /// True if the two intervals overlap or are separated by at most
    /// `threshold` bytes.
    pub fn is_near(&self, other: &Interval, threshold: u64) -> bool {
        self.start <= other.end.saturating_add(threshold)
            && other.start <= self.end.saturating_add(threshold)
    }

    /// Smallest interval covering both.
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// Content-addressed identity of a resource: the SHA-1 digest of its bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId([u8; RESOURCE_ID_LEN]);

impl ResourceId {
    /// Compute the identity of `data`.
    pub fn for_content(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut bytes = [0u8; RESOURCE_ID_LEN];
        bytes.copy_from_slice(&digest);
        ResourceId(bytes)
    }

    /// Wrap an existing digest.
    pub const fn from_bytes(bytes: [u8; RESOURCE_ID_LEN]) -> Self {
        ResourceId(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; RESOURCE_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self)
    }
}

/// Identity of a memory pool. Assigned monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub u32);

/// Application memory is pool 0; pools created by the pipeline start at 1.
impl PoolId {
    /// The application's own address space.
    pub const APPLICATION: PoolId = PoolId(0);

    /// True for the application address space.
    pub fn is_application(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Stream-wide identifier of a registered record type.
///
/// Ids are handed out in first-registration order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u64);

/// Identifier of a data or group-opening chunk. Starts at 1; 0 is "no chunk".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u64);

impl ChunkId {
    /// The root of the chunk forest.
    pub const ROOT: ChunkId = ChunkId(0);

    /// True for the root sentinel.
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}
