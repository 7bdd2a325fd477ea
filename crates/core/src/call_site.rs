// SPDX-License-Identifier: MIT

//! The textual position of a `spawn!` invocation (spec.md §3, "Call site").

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(source file, line, column)` triple identifying a `spawn!` call.
///
/// Immutable, and cheap to hash/compare so it can key the source-parse cache and the
/// scope-descriptor cache without cloning the file path repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub file: Utf8PathBuf,
    /// 1-based, matching `proc_macro::Span`/`syn::spanned::Spanned` conventions.
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    pub fn new(file: impl Into<Utf8PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A stable short key suitable for embedding in registry names and log file names.
    ///
    /// Not a cryptographic digest requirement, just collision-resistant enough for the
    /// call-site count of a real crate; see [`crate::location_key::LocationKey::segment_name`]
    /// for the shared-memory analogue.
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.file.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(self.line.to_le_bytes());
        hasher.update(b":");
        hasher.update(self.column.to_le_bytes());
        let digest = hasher.finalize();
        digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
#[path = "call_site_tests.rs"]
mod tests;
