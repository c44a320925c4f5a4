//! Type registry
//!
//! `TypeTable` is the canonical name -> id map. It lives under the
//! encoder's global lock and is the only place ids are handed out, so a
//! type never gets two ids even if two threads race to register it.
//!
//! `TypeCaches` is a small array of independently lockable copies of that
//! map. Lookups try them with `try_lock` and fall back to the global lock
//! when every shard is busy or the type is missing. A cache only ever holds
//! ids already assigned by the table.
//!
//! A type is identified by its name for the life of a stream. Registering a
//! different schema under a known name is a caller bug; debug builds catch
//! it on the table path.

use crate::message::encode_descriptor;
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use tracespy_core::{TypeDescriptor, TypeId};

/// Canonical registry of types seen in a stream.
#[derive(Debug, Default)]
pub struct TypeTable {
    ids: FxHashMap<String, TypeId>,
    /// Serialized descriptor of each type, indexed by id
    schemas: Vec<Vec<u8>>,
    /// Types whose nested types are being defined right now
    in_progress: Vec<String>,
}

impl TypeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of an already registered type.
    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.ids.get(name).copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Register `desc`, returning its id and whether it was new.
    ///
    /// On first registration every nested message type is registered first
    /// (depth first), then `define` is called for `desc` itself, so a
    /// definition always follows the definitions it refers to. Recursive
    /// schemas are cut at the type currently being defined.
    pub fn register(
        &mut self,
        desc: &TypeDescriptor,
        define: &mut dyn FnMut(TypeId, &TypeDescriptor),
    ) -> (TypeId, bool) {
        if let Some(id) = self.get(desc.name()) {
            debug_assert!(
                self.schemas[id.0 as usize] == encode_descriptor(desc),
                "type {} re-registered with a different schema",
                desc.name()
            );
            return (id, false);
        }

        self.in_progress.push(desc.name().to_string());
        for nested in desc.nested() {
            if !self.in_progress.iter().any(|n| n == nested.name()) {
                self.register(nested, define);
            }
        }
        self.in_progress.pop();

        let id = TypeId(self.ids.len() as u64);
        self.ids.insert(desc.name().to_string(), id);
        self.schemas.push(encode_descriptor(desc));
        define(id, desc);
        (id, true)
    }
}

/// Sharded, contention-avoiding copies of the type table.
pub struct TypeCaches {
    shards: Vec<Mutex<FxHashMap<String, TypeId>>>,
}

impl TypeCaches {
    /// Create `count` empty shards.
    pub fn new(count: usize) -> Self {
        TypeCaches {
            shards: (0..count.max(1))
                .map(|_| Mutex::new(FxHashMap::default()))
                .collect(),
        }
    }

    /// Lock the first shard that is free right now, if any.
    pub fn try_acquire(&self) -> Option<MutexGuard<'_, FxHashMap<String, TypeId>>> {
        self.shards.iter().find_map(|shard| shard.try_lock())
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
