//! Resource identifiers.
//!
//! A resource is keyed by the raw bytes of its path plus an optional
//! suffix that disambiguates variants of the same file (different compile
//! or load options). Lookups borrow a transient byte slice; only insertion
//! deep-copies into an owned [`ResourceKey`], which also records how many
//! trailing bytes are suffix so the unsuffixed path can be recovered.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Upper bound for a fully suffixed identifier. Exceeding it is a
/// programmer error, not a recoverable condition.
pub const MAX_KEY_LEN: usize = 512;

/// Caller-owned scratch used to concatenate path + suffix without
/// allocating. The manager never retains views into it.
pub struct KeyBuf {
    bytes: [u8; MAX_KEY_LEN],
}

impl KeyBuf {
    pub const fn new() -> Self {
        Self {
            bytes: [0; MAX_KEY_LEN],
        }
    }
}

impl Default for KeyBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full lookup key for `path` + `suffix`. An empty suffix
/// returns `path` unchanged; otherwise the concatenation is written into
/// `buf` and a view over it is returned.
///
/// Panics if the concatenation exceeds [`MAX_KEY_LEN`].
pub fn with_suffix<'a>(path: &'a [u8], buf: &'a mut KeyBuf, suffix: &[u8]) -> &'a [u8] {
    if suffix.is_empty() {
        return path;
    }
    let total = path.len() + suffix.len();
    assert!(
        total <= MAX_KEY_LEN,
        "suffixed identifier overflows key scratch: {} > {} bytes",
        total,
        MAX_KEY_LEN
    );
    buf.bytes[..path.len()].copy_from_slice(path);
    buf.bytes[path.len()..total].copy_from_slice(suffix);
    &buf.bytes[..total]
}

/// Owned identifier: full key bytes plus the recorded suffix length.
///
/// Equality and hashing cover the raw bytes only; `suffix_len` is derived
/// metadata (two live keys with equal bytes cannot coexist in a table).
#[derive(Clone)]
pub struct ResourceKey {
    bytes: Box<[u8]>,
    suffix_len: usize,
}

impl ResourceKey {
    /// Deep-copy `full` (path + suffix) into an owned key.
    ///
    /// Panics if `suffix_len` exceeds the key length.
    pub fn new(full: &[u8], suffix_len: usize) -> Self {
        assert!(
            suffix_len <= full.len(),
            "suffix length {} exceeds identifier length {}",
            suffix_len,
            full.len()
        );
        Self {
            bytes: full.into(),
            suffix_len,
        }
    }

    /// Key without any suffix.
    pub fn from_path(path: &[u8]) -> Self {
        Self::new(path, 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The identifier with the suffix stripped, i.e. the on-disk path.
    pub fn path(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - self.suffix_len]
    }

    pub fn suffix(&self) -> &[u8] {
        &self.bytes[self.bytes.len() - self.suffix_len..]
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ResourceKey {}

impl Hash for ResourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state)
    }
}

impl Borrow<[u8]> for ResourceKey {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix_len == 0 {
            write!(f, "{:?}", String::from_utf8_lossy(&self.bytes))
        } else {
            write!(
                f,
                "{:?}+{:?}",
                String::from_utf8_lossy(self.path()),
                String::from_utf8_lossy(self.suffix())
            )
        }
    }
}
