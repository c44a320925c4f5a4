//! Capture-wide set of resources already written.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracespy_core::ResourceId;

/// Digests of every resource written to the capture so far.
///
/// Shared by all observers and serializers of a session.
#[derive(Debug, Default)]
pub struct SeenResources {
    seen: DashMap<ResourceId, ()>,
}

impl SeenResources {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `emit` if `id` has not been seen, then mark it seen.
    ///
    /// `emit` runs while the digest's shard is locked, so a concurrent
    /// caller with the same digest waits until the resource is on the
    /// stream before it emits an observation referring to it. Returns
    /// whether `emit` ran.
    pub fn insert_with(&self, id: ResourceId, emit: impl FnOnce()) -> bool {
        match self.seen.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                emit();
                slot.insert(());
                true
            }
        }
    }

    /// True if `id` has been written.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.seen.contains_key(id)
    }

    /// Number of distinct resources written.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
