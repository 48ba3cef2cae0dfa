//! SlotTable: structural layer with stable positions and a debug
//! reentrancy guard.
//!
//! One table exists per resource type. Keys are [`ResourceKey`]s compared
//! over raw bytes; lookups borrow a `&[u8]` so callers never allocate to
//! probe. Each slot stores a precomputed hash and indexing always uses the
//! stored hash, so key bytes are never re-hashed after insertion.
//!
//! Positions are generational slotmap keys: removing an entry never moves
//! any other entry, so bulk sweeps can collect positions first and remove
//! them afterwards without swap-with-last bookkeeping.

use crate::key::ResourceKey;
use core::cell::Cell;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Debug-only guard against a handler callback re-entering a table whose
/// index is mid-mutation. Entering a second time before the first scope
/// drops panics in debug builds; release builds carry no counter.
#[derive(Debug, Default)]
struct MutationGuard {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // The tables are single-threaded; keep the guard !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl MutationGuard {
    const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    fn enter(&self) -> MutationScope<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.get(),
                "reentrant structural access to a resource table"
            );
            self.busy.set(true);
        }
        MutationScope { guard: self }
    }

    fn exit(&self) {
        #[cfg(debug_assertions)]
        self.busy.set(false);
    }
}

struct MutationScope<'a> {
    guard: &'a MutationGuard,
}

impl Drop for MutationScope<'_> {
    fn drop(&mut self) {
        self.guard.exit();
    }
}

/// Stable position of an entry within one table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot(DefaultKey);

impl Slot {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Slot(k)
    }

    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug)]
struct TableSlot<V> {
    key: ResourceKey,
    value: V,
    hash: u64,
}

/// Byte-keyed map with stable generational positions.
pub struct SlotTable<V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, TableSlot<V>>,
    guard: MutationGuard,
}

/// Structural insertion failure.
#[derive(Debug)]
pub enum InsertError {
    DuplicateKey,
}

impl<V> SlotTable<V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<V> Default for SlotTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> SlotTable<V, S>
where
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            index: HashTable::new(),
            hasher,
            slots: SlotMap::with_key(),
            guard: MutationGuard::new(),
        }
    }

    fn make_hash(&self, bytes: &[u8]) -> u64 {
        self.hasher.hash_one(bytes)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn find(&self, key: &[u8]) -> Option<Slot> {
        let _g = self.guard.enter();
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| s.key.as_bytes() == key)
                    .unwrap_or(false)
            })
            .map(|&k| Slot::new(k))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Insert an owned key and value; duplicate keys are rejected and the
    /// table is left unchanged.
    pub fn insert(&mut self, key: ResourceKey, value: V) -> Result<Slot, InsertError> {
        let _g = self.guard.enter();
        let hash = self.make_hash(key.as_bytes());
        match self.index.entry(
            hash,
            |&kk| {
                self.slots
                    .get(kk)
                    .map(|s| s.key == key)
                    .unwrap_or(false)
            },
            |&kk| self.slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(TableSlot { key, value, hash });
                let _ = v.insert(k);
                Ok(Slot::new(k))
            }
        }
    }

    /// Insert with a lazily built value; `default` runs only when the key
    /// is actually inserted.
    pub fn insert_with<F>(&mut self, key: ResourceKey, default: F) -> Result<Slot, InsertError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.guard.enter();
        let hash = self.make_hash(key.as_bytes());
        match self.index.entry(
            hash,
            |&kk| {
                self.slots
                    .get(kk)
                    .map(|s| s.key == key)
                    .unwrap_or(false)
            },
            |&kk| self.slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let value = default();
                let k = self.slots.insert(TableSlot { key, value, hash });
                let _ = v.insert(k);
                Ok(Slot::new(k))
            }
        }
    }

    /// Remove by position, returning the owned key and value. Stale slots
    /// yield `None`.
    pub fn remove(&mut self, slot: Slot) -> Option<(ResourceKey, V)> {
        let _g = self.guard.enter();
        let k = slot.raw();
        let s = self.slots.remove(k)?;
        self.index
            .find_entry(s.hash, |&kk| kk == k)
            .expect("index entry must exist for a live slot")
            .remove();
        Some((s.key, s.value))
    }

    pub fn key_at(&self, slot: Slot) -> Option<&ResourceKey> {
        self.slots.get(slot.raw()).map(|s| &s.key)
    }

    pub fn value_at(&self, slot: Slot) -> Option<&V> {
        self.slots.get(slot.raw()).map(|s| &s.value)
    }

    pub fn value_at_mut(&mut self, slot: Slot) -> Option<&mut V> {
        self.slots.get_mut(slot.raw()).map(|s| &mut s.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &ResourceKey, &V)> {
        self.slots
            .iter()
            .map(|(k, s)| (Slot::new(k), &s.key, &s.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Slot, &ResourceKey, &mut V)> {
        self.slots
            .iter_mut()
            .map(|(k, s)| (Slot::new(k), &s.key, &mut s.value))
    }

    /// Positions of every live entry, for two-pass sweeps that remove
    /// entries after deciding on them.
    pub fn collect_slots(&self) -> Vec<Slot> {
        self.slots.keys().map(Slot::new).collect()
    }
}
