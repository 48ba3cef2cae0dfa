//! res-cache: a single-threaded, reference-counted cache for engine
//! assets (textures, meshes, shaders, text and byte buffers) keyed by
//! path plus an optional disambiguating suffix.
//!
//! Internal design:
//!
//! Summary
//! - Goal: build the resource manager in safe, verifiable layers so each
//!   piece can be reasoned about independently.
//! - Layers:
//!   - SlotTable<V>: structural byte-keyed map returning stable
//!     generational positions for O(1) average access without re-hashing;
//!     includes a debug-only reentrancy guard to keep internals
//!     consistent while mutating. One table per [`ResourceType`].
//!   - ResourceEntry: payload plus its bookkeeping. A saturating u16
//!     reference count whose maximum value is the "not counted" sentinel,
//!     the file time recorded at insertion, a protection flag, and the
//!     tag of the allocator that produced the payload.
//!   - ResourceManager: the public API. Load (reference-counted or unique,
//!     handler-allocated or filled in place), unload, bulk reference
//!     counting, protection, snapshot/restore diffing, and
//!     disk-timestamp-driven eviction.
//!
//! Constraints
//! - Single-threaded tables: structural mutation is not locked
//!   internally; callers serialize it. Multi-key composite loads fence
//!   through [`CompositeLock`] and roll back on partial failure.
//! - Two allocators: the main allocator is single-threaded like the
//!   tables; the shared allocator hands blocks to worker threads. Every
//!   block routes back through the allocator that produced it.
//! - Stable positions: slotmap generations mean removing an entry never
//!   moves another, so bulk sweeps collect positions first and then
//!   mutate, with no swap-with-last bookkeeping.
//! - At most one live entry per (type, full identifier); a duplicate
//!   unique load is a programmer error and panics.
//!
//! Failure policy
//! - Handler failures surface as [`LoadError`] with no table mutation
//!   (in-place regions are freed).
//! - Invariant violations (duplicate unique loads, unloading a missing
//!   key on the fatal path, touching a protected entry, overflowing the
//!   key scratch) panic rather than return, since they are expected to
//!   be filtered out before reaching this layer.
//!
//! Hashing invariants
//! - Each slot stores a precomputed u64 hash over the identifier bytes
//!   and indexing always uses the stored hash; key bytes are never
//!   re-hashed after insertion.
//!
//! Notes and non-goals
//! - No LRU or TTL policy: eviction is explicit or driven by on-disk
//!   modification times.
//! - Snapshots are in-memory diff aids, never a persistence format.
//! - The resource type set is closed; dispatch is exhaustive at compile
//!   time, not extensible at runtime.

mod alloc;
mod composite;
mod descriptor;
mod entry;
mod error;
mod key;
mod manager;
mod payload;
mod slot_table;
mod snapshot;
mod timesource;
mod types;

// Public surface
pub use alloc::{AllocBlock, AllocatorPair, AllocatorTag, MainAllocator, SharedAllocator};
pub use composite::{CompositeLock, CompositeScope};
pub use descriptor::{LoadDescriptor, LoadOutcome};
pub use entry::{PayloadId, ResourceEntry, MAX_COUNT, NOT_COUNTED};
pub use error::LoadError;
pub use key::{with_suffix, KeyBuf, ResourceKey, MAX_KEY_LEN};
pub use manager::{EvictOptions, ResourceManager};
pub use payload::{
    CoalescedMeshData, CompositeMeshData, MaterialData, MeshData, MiscData, ResourcePayload,
    ShaderData, TextData, TextureData,
};
pub use slot_table::{InsertError, Slot, SlotTable};
pub use snapshot::{ResourceSnapshot, SnapshotDiff, SnapshotEntry};
pub use timesource::{FileTimeSource, NoFileTime, SystemFileTime};
pub use types::ResourceType;
