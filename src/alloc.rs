//! Dual-allocator payload memory.
//!
//! Payload buffers come from one of two allocators: the main allocator,
//! single-threaded like the tables themselves, and a shared allocator for
//! buffers produced on worker threads (decode-heavy loads). Each block is
//! tagged with its origin at allocation time and must be returned to the
//! allocator matching that tag, no matter which thread triggers the free.
//! Both allocators keep live block/byte accounting so tests can verify
//! that unloads balance loads.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Which allocator produced a payload buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AllocatorTag {
    Main,
    Shared,
}

impl fmt::Display for AllocatorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocatorTag::Main => f.write_str("main"),
            AllocatorTag::Shared => f.write_str("shared"),
        }
    }
}

/// A zero-initialized byte block that remembers its origin allocator.
pub struct AllocBlock {
    data: Box<[u8]>,
    tag: AllocatorTag,
}

impl AllocBlock {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tag(&self) -> AllocatorTag {
        self.tag
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for AllocBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocBlock")
            .field("len", &self.data.len())
            .field("tag", &self.tag)
            .finish()
    }
}

/// Single-threaded allocator owning most payload buffers. `!Sync` by
/// construction, matching the unlocked resource tables.
#[derive(Debug, Default)]
pub struct MainAllocator {
    live_blocks: Cell<usize>,
    live_bytes: Cell<usize>,
    _nosend: PhantomData<*mut ()>,
}

impl MainAllocator {
    pub const fn new() -> Self {
        Self {
            live_blocks: Cell::new(0),
            live_bytes: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    pub fn allocate(&self, len: usize) -> AllocBlock {
        self.live_blocks.set(self.live_blocks.get() + 1);
        self.live_bytes.set(self.live_bytes.get() + len);
        AllocBlock {
            data: vec![0u8; len].into_boxed_slice(),
            tag: AllocatorTag::Main,
        }
    }

    pub fn free(&self, block: AllocBlock) {
        assert_eq!(
            block.tag,
            AllocatorTag::Main,
            "block allocated from the {} allocator freed through main",
            block.tag
        );
        let blocks = self.live_blocks.get();
        assert!(blocks > 0, "main allocator free without matching allocate");
        self.live_blocks.set(blocks - 1);
        self.live_bytes.set(self.live_bytes.get() - block.len());
    }

    pub fn live_blocks(&self) -> usize {
        self.live_blocks.get()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }
}

/// Allocator for payloads produced off the main thread. Shared behind an
/// `Arc` handed to worker threads; accounting is atomic.
#[derive(Debug, Default)]
pub struct SharedAllocator {
    live_blocks: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl SharedAllocator {
    pub const fn new() -> Self {
        Self {
            live_blocks: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    pub fn allocate(&self, len: usize) -> AllocBlock {
        self.live_blocks.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_add(len, Ordering::Relaxed);
        AllocBlock {
            data: vec![0u8; len].into_boxed_slice(),
            tag: AllocatorTag::Shared,
        }
    }

    pub fn free(&self, block: AllocBlock) {
        assert_eq!(
            block.tag,
            AllocatorTag::Shared,
            "block allocated from the {} allocator freed through shared",
            block.tag
        );
        let prev = self.live_blocks.fetch_sub(1, Ordering::Relaxed);
        assert!(prev > 0, "shared allocator free without matching allocate");
        self.live_bytes.fetch_sub(block.len(), Ordering::Relaxed);
    }

    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::Relaxed)
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }
}

/// The allocator pair a manager owns. Frees route by each block's tag, so
/// a buffer decoded on a worker thread is returned to the shared
/// allocator even when the unload runs on the main thread.
#[derive(Debug, Default)]
pub struct AllocatorPair {
    main: MainAllocator,
    shared: Arc<SharedAllocator>,
}

impl AllocatorPair {
    pub fn new() -> Self {
        Self {
            main: MainAllocator::new(),
            shared: Arc::new(SharedAllocator::new()),
        }
    }

    pub fn allocate(&self, tag: AllocatorTag, len: usize) -> AllocBlock {
        match tag {
            AllocatorTag::Main => self.main.allocate(len),
            AllocatorTag::Shared => self.shared.allocate(len),
        }
    }

    pub fn free(&self, block: AllocBlock) {
        match block.tag() {
            AllocatorTag::Main => self.main.free(block),
            AllocatorTag::Shared => self.shared.free(block),
        }
    }

    /// Clone a handle to the shared allocator for worker threads.
    pub fn shared(&self) -> Arc<SharedAllocator> {
        Arc::clone(&self.shared)
    }

    pub fn main(&self) -> &MainAllocator {
        &self.main
    }

    /// Total blocks outstanding across both allocators.
    pub fn live_blocks(&self) -> usize {
        self.main.live_blocks() + self.shared.live_blocks()
    }
}
