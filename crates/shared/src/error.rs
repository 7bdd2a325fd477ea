// SPDX-License-Identifier: MIT

//! Errors raised by the shared-memory registry and the primitives built on it (spec.md §7.5).

use ispawn_core::LocationKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharedError {
    #[error("could not open shared segment '{key}': {reason}")]
    Open { key: LocationKey, reason: String },

    #[error("shared segment '{key}' requested at length {requested} but existing segment is {actual} bytes")]
    LengthMismatch {
        key: LocationKey,
        requested: usize,
        actual: usize,
    },

    /// spec.md §4.J / §7.5: releasing an unlocked mutex is an invariant violation, fatal by
    /// default. `Mutex::release` panics on this; `Mutex::try_release` returns it instead.
    #[error("attempted to release a mutex that was not locked")]
    NotLocked,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
