//! File modification time lookup.
//!
//! The manager records a file time at insertion and compares against it
//! during outdated-resource eviction. The source is a trait so tests can
//! substitute fabricated clocks; production uses the filesystem.

use std::fs;
use std::time::SystemTime;

pub trait FileTimeSource {
    /// Last write time of the file at `path` (identifier bytes with the
    /// suffix stripped), or `None` if the file cannot be queried.
    fn last_write(&self, path: &[u8]) -> Option<SystemTime>;
}

/// Filesystem-backed source. Identifier bytes must be valid UTF-8 paths.
#[derive(Debug, Default)]
pub struct SystemFileTime;

impl FileTimeSource for SystemFileTime {
    fn last_write(&self, path: &[u8]) -> Option<SystemTime> {
        let path = std::str::from_utf8(path).ok()?;
        fs::metadata(path).ok()?.modified().ok()
    }
}

/// Source that knows no files; every entry gets the epoch and eviction
/// never fires. Useful for managers holding purely procedural resources.
#[derive(Debug, Default)]
pub struct NoFileTime;

impl FileTimeSource for NoFileTime {
    fn last_write(&self, _path: &[u8]) -> Option<SystemTime> {
        None
    }
}
