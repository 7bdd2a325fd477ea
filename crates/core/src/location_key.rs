// SPDX-License-Identifier: MIT

//! Location-keyed identity for shared-memory primitives (spec.md §3, "Location key").
//!
//! A [`LocationKey`] names exactly one `Global::new(...)` call site, split into a `::state`
//! sub-key (the primitive's own synchronization word) and an optional `::data` sub-key (a user
//! payload buffer it wraps) — mirroring spec.md's `<file>:<line>:<column>[::state|::data]`
//! format. See [`crate::CallSite`] for the macro-side analogue that locates `spawn!` instead.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Which backing segment a [`LocationKey`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubKey {
    /// The primitive's own synchronization word(s).
    State,
    /// A user payload buffer the primitive protects or wraps.
    Data,
}

impl fmt::Display for SubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubKey::State => write!(f, "state"),
            SubKey::Data => write!(f, "data"),
        }
    }
}

/// Stable identity for one shared-memory segment, derived from a `Global::new` call site.
///
/// Two processes that construct a `Global<T>` at the same source location always compute the
/// same `LocationKey`, and therefore the same [`LocationKey::segment_name`] — this is what lets
/// `ispawn-shared::Registry` give them the same backing pages without any handshake message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub file: Utf8PathBuf,
    pub line: u32,
    pub column: u32,
    pub sub: SubKey,
}

impl LocationKey {
    pub fn new(file: impl Into<Utf8PathBuf>, line: u32, column: u32, sub: SubKey) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            sub,
        }
    }

    pub fn data_key(&self) -> LocationKey {
        LocationKey {
            sub: SubKey::Data,
            ..self.clone()
        }
    }

    /// Name of the POSIX shared-memory object backing this key.
    ///
    /// `shm_open` names are conventionally short (historically capped at 255 bytes on Linux,
    /// much less on some platforms), so this truncates the digest to 16 hex characters rather
    /// than embedding the file path verbatim.
    pub fn segment_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.file.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(self.line.to_le_bytes());
        hasher.update(b":");
        hasher.update(self.column.to_le_bytes());
        hasher.update(b":");
        hasher.update(self.sub.to_string().as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        format!("/ispawn-{hex}")
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}::{}", self.file, self.line, self.column, self.sub)
    }
}

#[cfg(test)]
#[path = "location_key_tests.rs"]
mod tests;
