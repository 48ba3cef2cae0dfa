//! Recoverable load failures.
//!
//! Only handler failures are surfaced as errors; invariant violations
//! (duplicate unique loads, unloading a protected entry, missing keys on a
//! fatal path) panic, since they are expected to be filtered out before
//! reaching this layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The decode step could not produce a payload.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Underlying file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An in-place handler declined to fill its payload region.
    #[error("in-place handler rejected the payload region")]
    FillRejected,
}
