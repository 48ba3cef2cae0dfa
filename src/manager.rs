//! The resource manager: one table per type, with load, unload,
//! reference counting, protection, and timestamp-driven eviction.
//!
//! The manager performs no internal locking; it is driven synchronously
//! from whichever thread the host schedules, and multi-key composite
//! loads serialize through [`crate::composite::CompositeLock`]. Handlers
//! may allocate payload buffers from either allocator of the pair; every
//! buffer routes back through the allocator that produced it on unload.

use crate::alloc::{AllocatorPair, SharedAllocator};
use crate::descriptor::{LoadDescriptor, LoadOutcome};
use crate::entry::{PayloadId, ResourceEntry, NOT_COUNTED};
use crate::error::LoadError;
use crate::key::{with_suffix, KeyBuf, ResourceKey};
use crate::payload::ResourcePayload;
use crate::slot_table::{InsertError, Slot, SlotTable};
use crate::timesource::{FileTimeSource, SystemFileTime};
use crate::types::ResourceType;
use std::sync::Arc;
use std::time::SystemTime;

/// Output collectors for [`ResourceManager::evict_outdated`]. When a
/// payload vector is supplied, evicted payloads are moved to the caller
/// instead of destroyed.
#[derive(Default)]
pub struct EvictOptions<'a> {
    pub evicted_keys: Option<&'a mut Vec<ResourceKey>>,
    pub evicted_payloads: Option<&'a mut Vec<ResourcePayload>>,
}

pub struct ResourceManager {
    tables: [SlotTable<ResourceEntry>; ResourceType::COUNT],
    allocs: AllocatorPair,
    time_source: Box<dyn FileTimeSource>,
    next_id: u64,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::with_time_source(Box::new(SystemFileTime))
    }

    pub fn with_time_source(time_source: Box<dyn FileTimeSource>) -> Self {
        Self {
            tables: Default::default(),
            allocs: AllocatorPair::new(),
            time_source,
            next_id: 0,
        }
    }

    pub fn allocators(&self) -> &AllocatorPair {
        &self.allocs
    }

    /// Handle to the shared allocator for worker-thread decodes.
    pub fn shared_allocator(&self) -> Arc<SharedAllocator> {
        self.allocs.shared()
    }

    fn table(&self, ty: ResourceType) -> &SlotTable<ResourceEntry> {
        &self.tables[ty.index()]
    }

    fn table_mut(&mut self, ty: ResourceType) -> &mut SlotTable<ResourceEntry> {
        &mut self.tables[ty.index()]
    }

    fn mint_id(&mut self) -> PayloadId {
        let id = PayloadId(self.next_id);
        self.next_id += 1;
        id
    }

    fn file_time(&self, path: &[u8]) -> SystemTime {
        self.time_source
            .last_write(path)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }

    fn insert_entry(
        &mut self,
        ty: ResourceType,
        key: ResourceKey,
        payload: ResourcePayload,
        ref_count: u16,
        time_stamp: SystemTime,
        desc: &LoadDescriptor<'_>,
    ) -> (Slot, PayloadId) {
        assert_eq!(
            payload.resource_type(),
            ty,
            "a {} payload cannot be inserted into the {} table",
            payload.resource_type(),
            ty
        );
        let id = self.mint_id();
        let mut entry = ResourceEntry::new(payload, id, ref_count, time_stamp, desc.allocator);
        entry.set_temporary(desc.temporary);
        match self.table_mut(ty).insert(key, entry) {
            Ok(slot) => (slot, id),
            // Callers check for duplicates before building the entry.
            Err(InsertError::DuplicateKey) => unreachable!("duplicate checked before insert"),
        }
    }

    fn remove_slot(&mut self, ty: ResourceType, slot: Slot) -> (ResourceKey, ResourceEntry) {
        self.tables[ty.index()]
            .remove(slot)
            .expect("slot must refer to a live entry")
    }

    fn unload_slot(&mut self, ty: ResourceType, slot: Slot) {
        let (key, entry) = self.remove_slot(ty, slot);
        log::debug!("unloading {} {:?}", ty, key);
        entry.into_payload().unload(&self.allocs);
    }

    // ----- loads -----

    /// Reference-counted load. If the key is present the handler is not
    /// invoked and the existing entry gains `desc.increment` references;
    /// otherwise the handler produces the payload and the entry is
    /// inserted with `desc.increment` as its initial count.
    pub fn load<F>(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        desc: &LoadDescriptor<'_>,
        handler: F,
    ) -> Result<LoadOutcome, LoadError>
    where
        F: FnOnce(&AllocatorPair) -> Result<ResourcePayload, LoadError>,
    {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);

        if let Some(slot) = self.table(ty).find(full) {
            let entry = self
                .tables[ty.index()]
                .value_at_mut(slot)
                .expect("found slot resolves");
            entry.increment(desc.increment);
            return Ok(LoadOutcome {
                id: entry.id(),
                first_load: false,
            });
        }

        let payload = handler(&self.allocs)?;
        let ts = self.file_time(path);
        let key = ResourceKey::new(full, desc.suffix.len());
        log::debug!("loaded {} {:?}", ty, key);
        let (_slot, id) = self.insert_entry(ty, key, payload, desc.increment, ts, desc);
        Ok(LoadOutcome {
            id,
            first_load: true,
        })
    }

    /// Non-reference-counted load: the key must be absent (a duplicate is
    /// a programmer error) and the entry is inserted with the sentinel
    /// count, so only explicit unloads remove it.
    pub fn load_unique<F>(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        desc: &LoadDescriptor<'_>,
        handler: F,
    ) -> Result<LoadOutcome, LoadError>
    where
        F: FnOnce(&AllocatorPair) -> Result<ResourcePayload, LoadError>,
    {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        assert!(
            !self.table(ty).contains_key(full),
            "duplicate unique load of {} {:?}",
            ty,
            String::from_utf8_lossy(full)
        );

        let payload = handler(&self.allocs)?;
        let ts = self.file_time(path);
        let key = ResourceKey::new(full, desc.suffix.len());
        log::debug!("loaded {} {:?} (not counted)", ty, key);
        let (_slot, id) = self.insert_entry(ty, key, payload, NOT_COUNTED, ts, desc);
        Ok(LoadOutcome {
            id,
            first_load: true,
        })
    }

    /// Reference-counted in-place load: the manager allocates a zeroed
    /// region of `size` bytes from the descriptor's allocator and the
    /// handler fills it. On failure the region is freed and nothing is
    /// inserted. Only byte-buffer-shaped types support this flavor.
    pub fn load_in_place<F>(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        size: usize,
        desc: &LoadDescriptor<'_>,
        fill: F,
    ) -> Result<LoadOutcome, LoadError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), LoadError>,
    {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);

        if let Some(slot) = self.table(ty).find(full) {
            let entry = self
                .tables[ty.index()]
                .value_at_mut(slot)
                .expect("found slot resolves");
            entry.increment(desc.increment);
            return Ok(LoadOutcome {
                id: entry.id(),
                first_load: false,
            });
        }

        let mut block = self.allocs.allocate(desc.allocator, size);
        if let Err(e) = fill(block.as_mut_slice()) {
            self.allocs.free(block);
            return Err(e);
        }
        let payload = ResourcePayload::from_block(ty, block);
        let ts = self.file_time(path);
        let key = ResourceKey::new(full, desc.suffix.len());
        log::debug!("loaded {} {:?} in place ({} bytes)", ty, key, size);
        let (_slot, id) = self.insert_entry(ty, key, payload, desc.increment, ts, desc);
        Ok(LoadOutcome {
            id,
            first_load: true,
        })
    }

    /// In-place flavor of [`Self::load_unique`].
    pub fn load_in_place_unique<F>(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        size: usize,
        desc: &LoadDescriptor<'_>,
        fill: F,
    ) -> Result<LoadOutcome, LoadError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), LoadError>,
    {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        assert!(
            !self.table(ty).contains_key(full),
            "duplicate unique load of {} {:?}",
            ty,
            String::from_utf8_lossy(full)
        );

        let mut block = self.allocs.allocate(desc.allocator, size);
        if let Err(e) = fill(block.as_mut_slice()) {
            self.allocs.free(block);
            return Err(e);
        }
        let payload = ResourcePayload::from_block(ty, block);
        let ts = self.file_time(path);
        let key = ResourceKey::new(full, desc.suffix.len());
        let (_slot, id) = self.insert_entry(ty, key, payload, NOT_COUNTED, ts, desc);
        Ok(LoadOutcome {
            id,
            first_load: true,
        })
    }

    /// Adopt an externally constructed payload (e.g. transferred from
    /// another manager sharing the same device). Duplicate keys are a
    /// programmer error.
    pub fn add_resource(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        payload: ResourcePayload,
        desc: &LoadDescriptor<'_>,
        time_stamp: Option<SystemTime>,
        initial_count: u16,
    ) -> Slot {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        assert!(
            !self.table(ty).contains_key(full),
            "add_resource over existing {} {:?}",
            ty,
            String::from_utf8_lossy(full)
        );
        let ts = time_stamp.unwrap_or_else(|| self.file_time(path));
        let key = ResourceKey::new(full, desc.suffix.len());
        log::debug!("adopted {} {:?}", ty, key);
        let (slot, _id) = self.insert_entry(ty, key, payload, initial_count, ts, desc);
        slot
    }

    // ----- unloads and reference counting -----

    /// Reference-counted unload: drops `desc.increment` references and
    /// removes the entry (invoking its unload) only when the count reaches
    /// exactly zero. Sentinel entries are immune. Returns true when the
    /// entry was removed.
    ///
    /// Panics when the key is missing, unless `desc.check_before_unload`
    /// is set; panics when the entry is protected.
    pub fn unload(&mut self, path: &[u8], ty: ResourceType, desc: &LoadDescriptor<'_>) -> bool {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        let slot = match self.table(ty).find(full) {
            Some(slot) => slot,
            None if desc.check_before_unload => return false,
            None => panic!(
                "unload of missing {} {:?}",
                ty,
                String::from_utf8_lossy(full)
            ),
        };
        self.unload_counted_at(ty, slot, desc.increment)
    }

    /// [`Self::unload`] that tolerates a missing key.
    pub fn try_unload(&mut self, path: &[u8], ty: ResourceType, desc: &LoadDescriptor<'_>) -> bool {
        let tolerant = LoadDescriptor {
            check_before_unload: true,
            ..desc.clone()
        };
        self.unload(path, ty, &tolerant)
    }

    /// Reference-counted unload by position.
    pub fn unload_counted_at(&mut self, ty: ResourceType, slot: Slot, amount: u16) -> bool {
        {
            let entry = self
                .table(ty)
                .value_at(slot)
                .expect("unload of a stale slot");
            assert!(
                !entry.is_protected(),
                "unload of protected {} {:?}",
                ty,
                self.table(ty).key_at(slot).expect("live slot has a key")
            );
            if !entry.is_counted() {
                return false;
            }
        }
        let now = self
            .tables[ty.index()]
            .value_at_mut(slot)
            .expect("live slot resolves")
            .decrement(amount);
        if now == 0 {
            self.unload_slot(ty, slot);
            return true;
        }
        false
    }

    /// Unconditional (non-reference-counted) removal by key. Panics on a
    /// missing key unless `desc.check_before_unload` is set, and on a
    /// protected entry.
    pub fn force_unload(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        desc: &LoadDescriptor<'_>,
    ) -> bool {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        let slot = match self.table(ty).find(full) {
            Some(slot) => slot,
            None if desc.check_before_unload => return false,
            None => panic!(
                "force unload of missing {} {:?}",
                ty,
                String::from_utf8_lossy(full)
            ),
        };
        self.force_unload_at(ty, slot);
        true
    }

    /// Unconditional removal by position.
    pub fn force_unload_at(&mut self, ty: ResourceType, slot: Slot) {
        let entry = self
            .table(ty)
            .value_at(slot)
            .expect("unload of a stale slot");
        assert!(
            !entry.is_protected(),
            "unload of protected {} {:?}",
            ty,
            self.table(ty).key_at(slot).expect("live slot has a key")
        );
        self.unload_slot(ty, slot);
    }

    /// Add references to a single entry. Panics when the key is missing.
    pub fn increment_count(&mut self, path: &[u8], ty: ResourceType, suffix: &[u8], amount: u16) {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        let slot = self
            .table(ty)
            .find(full)
            .unwrap_or_else(|| {
                panic!(
                    "increment of missing {} {:?}",
                    ty,
                    String::from_utf8_lossy(full)
                )
            });
        self.tables[ty.index()]
            .value_at_mut(slot)
            .expect("found slot resolves")
            .increment(amount);
    }

    /// Drop references from a single entry without removing it at zero;
    /// returns the new count. Sentinel entries are untouched and report
    /// the sentinel. Panics when the key is missing or the entry is
    /// protected.
    pub fn decrement_count(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        suffix: &[u8],
        amount: u16,
    ) -> u16 {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        let slot = self
            .table(ty)
            .find(full)
            .unwrap_or_else(|| {
                panic!(
                    "decrement of missing {} {:?}",
                    ty,
                    String::from_utf8_lossy(full)
                )
            });
        {
            let entry = self.table(ty).value_at(slot).expect("found slot resolves");
            assert!(
                !entry.is_protected(),
                "decrement of protected {} {:?}",
                ty,
                self.table(ty).key_at(slot).expect("live slot has a key")
            );
        }
        self.tables[ty.index()]
            .value_at_mut(slot)
            .expect("found slot resolves")
            .decrement(amount)
    }

    /// Add references to every counted entry of `ty`. Protected entries
    /// are skipped.
    pub fn increment_all(&mut self, ty: ResourceType, amount: u16) {
        for (_slot, _key, entry) in self.tables[ty.index()].iter_mut() {
            if entry.is_protected() {
                continue;
            }
            entry.increment(amount);
        }
    }

    /// Drop references from every counted entry of `ty`. With
    /// `auto_delete`, entries reaching zero are removed and unloaded;
    /// without it they stay resident at zero so a later load revives them
    /// without re-decoding. Protected entries are skipped with a warning.
    /// Returns the number of entries removed.
    pub fn decrement_all(&mut self, ty: ResourceType, amount: u16, auto_delete: bool) -> usize {
        let slots = self.tables[ty.index()].collect_slots();
        let mut removed = 0;
        for slot in slots {
            {
                let entry = self
                    .table(ty)
                    .value_at(slot)
                    .expect("collected slot resolves");
                if entry.is_protected() {
                    log::warn!(
                        "bulk decrement skipping protected {} {:?}",
                        ty,
                        self.table(ty).key_at(slot).expect("live slot has a key")
                    );
                    continue;
                }
                if !entry.is_counted() {
                    continue;
                }
            }
            let now = self
                .tables[ty.index()]
                .value_at_mut(slot)
                .expect("collected slot resolves")
                .decrement(amount);
            if now == 0 && auto_delete {
                self.unload_slot(ty, slot);
                removed += 1;
            }
        }
        removed
    }

    /// Unload every non-protected entry of `ty`, sentinel entries
    /// included. Protected entries are skipped with a warning.
    pub fn unload_all(&mut self, ty: ResourceType) -> usize {
        let slots = self.tables[ty.index()].collect_slots();
        let mut removed = 0;
        for slot in slots {
            let entry = self
                .table(ty)
                .value_at(slot)
                .expect("collected slot resolves");
            if entry.is_protected() {
                log::warn!(
                    "unload_all skipping protected {} {:?}",
                    ty,
                    self.table(ty).key_at(slot).expect("live slot has a key")
                );
                continue;
            }
            self.unload_slot(ty, slot);
            removed += 1;
        }
        removed
    }

    /// Full teardown: unload every entry of every type. Protection is
    /// overridden (with a warning) so shutdown cannot leak payloads.
    /// Blocks inside payloads the caller took out of the tables (eviction
    /// collectors, undecoded worker blocks) stay live until the caller
    /// frees them.
    pub fn unload_everything(&mut self) {
        for ty in ResourceType::ALL {
            let slots = self.tables[ty.index()].collect_slots();
            for slot in slots {
                let protected = self
                    .table(ty)
                    .value_at(slot)
                    .expect("collected slot resolves")
                    .is_protected();
                if protected {
                    log::warn!(
                        "teardown unloading protected {} {:?}",
                        ty,
                        self.table(ty).key_at(slot).expect("live slot has a key")
                    );
                    self.tables[ty.index()]
                        .value_at_mut(slot)
                        .expect("collected slot resolves")
                        .set_protected(false);
                }
                self.unload_slot(ty, slot);
            }
        }
    }

    // ----- accessors -----

    pub fn exists(&self, path: &[u8], ty: ResourceType, suffix: &[u8]) -> bool {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        self.table(ty).contains_key(full)
    }

    /// Stable position of an entry, if present.
    pub fn resource_slot(&self, path: &[u8], ty: ResourceType, suffix: &[u8]) -> Option<Slot> {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        self.table(ty).find(full)
    }

    pub fn payload(&self, path: &[u8], ty: ResourceType, suffix: &[u8]) -> Option<&ResourcePayload> {
        self.resource_slot(path, ty, suffix)
            .and_then(|slot| self.payload_at(ty, slot))
    }

    pub fn payload_at(&self, ty: ResourceType, slot: Slot) -> Option<&ResourcePayload> {
        self.table(ty).value_at(slot).map(ResourceEntry::payload)
    }

    pub fn payload_at_mut(&mut self, ty: ResourceType, slot: Slot) -> Option<&mut ResourcePayload> {
        self.tables[ty.index()]
            .value_at_mut(slot)
            .map(ResourceEntry::payload_mut)
    }

    pub fn entry(&self, path: &[u8], ty: ResourceType, suffix: &[u8]) -> Option<&ResourceEntry> {
        self.resource_slot(path, ty, suffix)
            .and_then(|slot| self.entry_at(ty, slot))
    }

    pub fn entry_at(&self, ty: ResourceType, slot: Slot) -> Option<&ResourceEntry> {
        self.table(ty).value_at(slot)
    }

    pub fn key_at(&self, ty: ResourceType, slot: Slot) -> Option<&ResourceKey> {
        self.table(ty).key_at(slot)
    }

    pub fn len(&self, ty: ResourceType) -> usize {
        self.table(ty).len()
    }

    pub fn total_len(&self) -> usize {
        ResourceType::ALL.iter().map(|ty| self.len(*ty)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn iter(
        &self,
        ty: ResourceType,
    ) -> impl Iterator<Item = (Slot, &ResourceKey, &ResourceEntry)> {
        self.table(ty).iter()
    }

    /// Positions of every live entry of `ty`, for two-pass sweeps.
    pub fn slots_of(&self, ty: ResourceType) -> Vec<Slot> {
        self.table(ty).collect_slots()
    }

    // ----- protection -----

    /// Mark an entry immune to unloads, eviction, and bulk reference
    /// counting. Panics when the key is missing.
    pub fn protect(&mut self, path: &[u8], ty: ResourceType, suffix: &[u8]) {
        self.set_protected(path, ty, suffix, true)
    }

    pub fn unprotect(&mut self, path: &[u8], ty: ResourceType, suffix: &[u8]) {
        self.set_protected(path, ty, suffix, false)
    }

    fn set_protected(&mut self, path: &[u8], ty: ResourceType, suffix: &[u8], protected: bool) {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        let slot = self
            .table(ty)
            .find(full)
            .unwrap_or_else(|| {
                panic!(
                    "protection toggle on missing {} {:?}",
                    ty,
                    String::from_utf8_lossy(full)
                )
            });
        self.tables[ty.index()]
            .value_at_mut(slot)
            .expect("found slot resolves")
            .set_protected(protected);
    }

    /// Protect by payload identity. Linear scan over the type's table;
    /// returns whether a matching entry was found. With
    /// `assert_if_missing`, a miss is a programmer error.
    pub fn protect_by_payload(
        &mut self,
        ty: ResourceType,
        id: PayloadId,
        assert_if_missing: bool,
    ) -> bool {
        self.set_protected_by_payload(ty, id, true, assert_if_missing)
    }

    pub fn unprotect_by_payload(
        &mut self,
        ty: ResourceType,
        id: PayloadId,
        assert_if_missing: bool,
    ) -> bool {
        self.set_protected_by_payload(ty, id, false, assert_if_missing)
    }

    fn set_protected_by_payload(
        &mut self,
        ty: ResourceType,
        id: PayloadId,
        protected: bool,
        assert_if_missing: bool,
    ) -> bool {
        for (_slot, _key, entry) in self.tables[ty.index()].iter_mut() {
            if entry.id() == id {
                entry.set_protected(protected);
                return true;
            }
        }
        assert!(
            !assert_if_missing,
            "protection toggle on unknown {} payload {:?}",
            ty, id
        );
        false
    }

    // ----- timestamps and eviction -----

    /// Overwrite the recorded file time of an entry. Panics when the key
    /// is missing.
    pub fn update_time_stamp(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        suffix: &[u8],
        ts: SystemTime,
    ) {
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        let slot = self
            .table(ty)
            .find(full)
            .unwrap_or_else(|| {
                panic!(
                    "timestamp update on missing {} {:?}",
                    ty,
                    String::from_utf8_lossy(full)
                )
            });
        self.tables[ty.index()]
            .value_at_mut(slot)
            .expect("found slot resolves")
            .set_time_stamp(ts);
    }

    /// Swap an entry's payload for a new one, unloading the old payload.
    /// The reference count is untouched; a fresh payload id is minted.
    /// Panics when the key is missing, on a protected entry, and on a
    /// payload/type mismatch.
    pub fn rebind(
        &mut self,
        path: &[u8],
        ty: ResourceType,
        suffix: &[u8],
        new_payload: ResourcePayload,
    ) -> PayloadId {
        assert_eq!(
            new_payload.resource_type(),
            ty,
            "a {} payload cannot rebind a {} entry",
            new_payload.resource_type(),
            ty
        );
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, suffix);
        let slot = self
            .table(ty)
            .find(full)
            .unwrap_or_else(|| {
                panic!("rebind of missing {} {:?}", ty, String::from_utf8_lossy(full))
            });
        let id = self.mint_id();
        let entry = self
            .tables[ty.index()]
            .value_at_mut(slot)
            .expect("found slot resolves");
        assert!(!entry.is_protected(), "rebind of protected {} entry", ty);
        let old = std::mem::replace(entry.payload_mut(), new_payload);
        entry.set_payload_id(id);
        old.unload(&self.allocs);
        id
    }

    /// Evict every entry of `ty` whose on-disk file is strictly newer
    /// than the recorded time. Protected entries are skipped with a
    /// warning; entries whose file time cannot be queried are left alone.
    /// Returns the number of evicted entries.
    pub fn evict_outdated(&mut self, ty: ResourceType, options: &mut EvictOptions<'_>) -> usize {
        let slots = self.tables[ty.index()].collect_slots();
        let mut evicted = 0;
        for slot in slots {
            let (stale, protected) = {
                let key = self.table(ty).key_at(slot).expect("collected slot resolves");
                let entry = self.table(ty).value_at(slot).expect("collected slot resolves");
                let disk = self.time_source.last_write(key.path());
                (
                    matches!(disk, Some(d) if d > entry.time_stamp()),
                    entry.is_protected(),
                )
            };
            if !stale {
                continue;
            }
            if protected {
                log::warn!(
                    "eviction skipping protected outdated {} {:?}",
                    ty,
                    self.table(ty).key_at(slot).expect("live slot has a key")
                );
                continue;
            }
            let (key, entry) = self.remove_slot(ty, slot);
            log::info!("evicting outdated {} {:?}", ty, key);
            if let Some(keys) = options.evicted_keys.as_deref_mut() {
                keys.push(key);
            }
            let payload = entry.into_payload();
            match options.evicted_payloads.as_deref_mut() {
                Some(payloads) => payloads.push(payload),
                None => payload.unload(&self.allocs),
            }
            evicted += 1;
        }
        evicted
    }
}
