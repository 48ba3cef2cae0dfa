//! Composite (multi-key) loads.
//!
//! A full material is several sub-loads: a shader plus its textures. No
//! other thread may observe the tables with only part of the composite
//! inserted, so callers take a [`CompositeLock`] once around the whole
//! group; the guard is released on every exit path, including panics and
//! load failures. If a sub-load fails partway, every sub-load already made
//! in the scope is rolled back with the matching unload before the error
//! is returned.

use crate::alloc::AllocatorPair;
use crate::descriptor::{LoadDescriptor, LoadOutcome};
use crate::error::LoadError;
use crate::key::{with_suffix, KeyBuf, ResourceKey};
use crate::manager::ResourceManager;
use crate::payload::ResourcePayload;
use crate::types::ResourceType;
use std::sync::{Mutex, PoisonError};

/// Lock serializing composite loads across the host's threads. The
/// manager itself stays unlocked; this only fences multi-key groups.
#[derive(Debug, Default)]
pub struct CompositeLock {
    mutex: Mutex<()>,
}

impl CompositeLock {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records the sub-loads of one composite so they can be rolled back.
pub struct CompositeScope<'m> {
    mgr: &'m mut ResourceManager,
    loaded: Vec<(ResourceType, ResourceKey, u16)>,
}

impl CompositeScope<'_> {
    /// Reference-counted sub-load, recorded for rollback unless the
    /// descriptor sets `skip_subresources`.
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
        let out = self.mgr.load(path, ty, desc, handler)?;
        self.record(path, ty, desc);
        Ok(out)
    }

    /// In-place sub-load, recorded like [`Self::load`].
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
        let out = self.mgr.load_in_place(path, ty, size, desc, fill)?;
        self.record(path, ty, desc);
        Ok(out)
    }

    fn record(&mut self, path: &[u8], ty: ResourceType, desc: &LoadDescriptor<'_>) {
        if desc.skip_subresources {
            return;
        }
        let mut buf = KeyBuf::new();
        let full = with_suffix(path, &mut buf, desc.suffix);
        self.loaded
            .push((ty, ResourceKey::new(full, desc.suffix.len()), desc.increment));
    }

    /// Escape hatch for operations the scope does not wrap. Anything done
    /// here is not rolled back.
    pub fn manager(&mut self) -> &mut ResourceManager {
        self.mgr
    }
}

impl ResourceManager {
    /// Run `f` with the composite lock held. On error, the scope's
    /// recorded sub-loads are unloaded in reverse order before the error
    /// is returned; the lock is released on every path.
    pub fn composite_load<R, F>(&mut self, lock: &CompositeLock, f: F) -> Result<R, LoadError>
    where
        F: FnOnce(&mut CompositeScope<'_>) -> Result<R, LoadError>,
    {
        let _guard = lock.mutex.lock().unwrap_or_else(PoisonError::into_inner);
        let mut scope = CompositeScope {
            mgr: self,
            loaded: Vec::new(),
        };
        match f(&mut scope) {
            Ok(r) => Ok(r),
            Err(e) => {
                let loaded = std::mem::take(&mut scope.loaded);
                for (ty, key, amount) in loaded.into_iter().rev() {
                    log::debug!("rolling back composite sub-load {} {:?}", ty, key);
                    let desc = LoadDescriptor {
                        increment: amount,
                        check_before_unload: true,
                        ..Default::default()
                    };
                    scope.mgr.unload(key.as_bytes(), ty, &desc);
                }
                Err(e)
            }
        }
    }
}
