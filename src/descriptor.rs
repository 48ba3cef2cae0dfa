//! Per-call load/unload configuration.

use crate::alloc::AllocatorTag;
use crate::entry::PayloadId;

/// Options passed to every load and unload call. The defaults describe
/// the common case: no suffix, increment of one, main allocator.
#[derive(Clone, Debug)]
pub struct LoadDescriptor<'a> {
    /// Bytes appended to the path to form the full identifier.
    pub suffix: &'a [u8],
    /// Reference count delta requested by this call.
    pub increment: u16,
    /// Allocator used for in-place payload regions.
    pub allocator: AllocatorTag,
    /// Mark the entry temporary: snapshot capture skips it, so a restore
    /// evicts it as a post-snapshot addition.
    pub temporary: bool,
    /// Inside a composite scope: do not record this sub-load for rollback.
    pub skip_subresources: bool,
    /// On unload: missing keys are tolerated instead of fatal.
    pub check_before_unload: bool,
}

impl Default for LoadDescriptor<'_> {
    fn default() -> Self {
        Self {
            suffix: b"",
            increment: 1,
            allocator: AllocatorTag::Main,
            temporary: false,
            skip_subresources: false,
            check_before_unload: false,
        }
    }
}

impl<'a> LoadDescriptor<'a> {
    pub fn with_suffix(suffix: &'a [u8]) -> Self {
        Self {
            suffix,
            ..Default::default()
        }
    }

    pub fn increment(mut self, amount: u16) -> Self {
        self.increment = amount;
        self
    }

    pub fn allocator(mut self, tag: AllocatorTag) -> Self {
        self.allocator = tag;
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }
}

/// What a load call produced.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LoadOutcome {
    /// Stable identity of the (possibly pre-existing) payload.
    pub id: PayloadId,
    /// True when this call invoked the handler and inserted the entry;
    /// false when an existing entry satisfied the request.
    pub first_load: bool,
}
