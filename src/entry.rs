//! Per-resource table entries.
//!
//! An entry carries the payload together with its bookkeeping: a
//! saturating 16-bit reference count (where `NOT_COUNTED` marks an entry
//! that is never decremented), the file time recorded at insertion, a
//! protection flag, and the tag of the allocator that produced the
//! payload's buffers. The suffix length lives on the key itself (see
//! `key.rs`).

use crate::alloc::AllocatorTag;
use crate::payload::ResourcePayload;
use std::time::SystemTime;

/// Sentinel reference count: the entry is not reference counted and is
/// only removed by an explicit unload or eviction.
pub const NOT_COUNTED: u16 = u16::MAX;

/// Largest count an increment may produce; increments never reach the
/// sentinel accidentally.
pub const MAX_COUNT: u16 = NOT_COUNTED - 1;

/// Stable identity of a payload, minted at insertion. Survives table
/// reallocation, unlike a payload's address.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PayloadId(pub(crate) u64);

#[derive(Debug)]
pub struct ResourceEntry {
    pub(crate) payload: ResourcePayload,
    id: PayloadId,
    ref_count: u16,
    time_stamp: SystemTime,
    protected: bool,
    temporary: bool,
    tag: AllocatorTag,
}

impl ResourceEntry {
    pub(crate) fn new(
        payload: ResourcePayload,
        id: PayloadId,
        ref_count: u16,
        time_stamp: SystemTime,
        tag: AllocatorTag,
    ) -> Self {
        Self {
            payload,
            id,
            ref_count,
            time_stamp,
            protected: false,
            temporary: false,
            tag,
        }
    }

    pub fn payload(&self) -> &ResourcePayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut ResourcePayload {
        &mut self.payload
    }

    pub(crate) fn into_payload(self) -> ResourcePayload {
        self.payload
    }

    pub(crate) fn set_payload_id(&mut self, id: PayloadId) {
        self.id = id;
    }

    pub fn id(&self) -> PayloadId {
        self.id
    }

    pub fn ref_count(&self) -> u16 {
        self.ref_count
    }

    /// False for sentinel entries.
    pub fn is_counted(&self) -> bool {
        self.ref_count != NOT_COUNTED
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub(crate) fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    /// Temporary entries are skipped by snapshot capture, so a later
    /// restore evicts them as post-snapshot additions.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub(crate) fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    pub fn time_stamp(&self) -> SystemTime {
        self.time_stamp
    }

    pub(crate) fn set_time_stamp(&mut self, ts: SystemTime) {
        self.time_stamp = ts;
    }

    pub fn allocator_tag(&self) -> AllocatorTag {
        self.tag
    }

    /// Add `amount` references, clamping below the sentinel. Sentinel
    /// entries are untouched.
    pub(crate) fn increment(&mut self, amount: u16) {
        if self.ref_count == NOT_COUNTED {
            return;
        }
        self.ref_count = self.ref_count.saturating_add(amount).min(MAX_COUNT);
    }

    /// Drop `amount` references, saturating at zero; returns the new
    /// count. Sentinel entries are untouched and report the sentinel.
    pub(crate) fn decrement(&mut self, amount: u16) -> u16 {
        if self.ref_count == NOT_COUNTED {
            return NOT_COUNTED;
        }
        self.ref_count = self.ref_count.saturating_sub(amount);
        self.ref_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{AllocatorPair, AllocatorTag};
    use crate::payload::ResourcePayload;
    use crate::types::ResourceType;

    fn entry(count: u16, allocs: &AllocatorPair) -> ResourceEntry {
        let payload =
            ResourcePayload::from_block(ResourceType::Misc, allocs.allocate(AllocatorTag::Main, 4));
        ResourceEntry::new(
            payload,
            PayloadId(1),
            count,
            SystemTime::UNIX_EPOCH,
            AllocatorTag::Main,
        )
    }

    fn finish(e: ResourceEntry, allocs: &AllocatorPair) {
        e.payload.unload(allocs);
    }

    /// Invariant: the sentinel is monotone; neither increment nor
    /// decrement moves an entry off it.
    #[test]
    fn sentinel_is_immune() {
        let allocs = AllocatorPair::new();
        let mut e = entry(NOT_COUNTED, &allocs);
        e.increment(5);
        assert_eq!(e.ref_count(), NOT_COUNTED);
        assert_eq!(e.decrement(5), NOT_COUNTED);
        assert!(!e.is_counted());
        finish(e, &allocs);
    }

    /// Invariant: increments clamp just below the sentinel so a counted
    /// entry can never become permanent by accident.
    #[test]
    fn increment_clamps_below_sentinel() {
        let allocs = AllocatorPair::new();
        let mut e = entry(MAX_COUNT - 1, &allocs);
        e.increment(10);
        assert_eq!(e.ref_count(), MAX_COUNT);
        assert!(e.is_counted());
        finish(e, &allocs);
    }

    /// Invariant: decrements saturate at zero.
    #[test]
    fn decrement_saturates_at_zero() {
        let allocs = AllocatorPair::new();
        let mut e = entry(3, &allocs);
        assert_eq!(e.decrement(2), 1);
        assert_eq!(e.decrement(5), 0);
        assert_eq!(e.decrement(1), 0);
        finish(e, &allocs);
    }
}
