// SPDX-License-Identifier: MIT

//! Memoized `syn::File` parsing (spec.md §4.B).
//!
//! A proc-macro runs once per invocation site but a file can hold many `spawn!` calls, so we
//! parse each source file at most once per compilation rather than once per call site.

use crate::error::AnalyzeError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

type Cache = Mutex<HashMap<PathBuf, Arc<syn::File>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the parsed syntax tree for `path`, parsing and caching it on first access.
///
/// Never invalidated: a single `rustc` invocation only ever sees one set of bytes for a given
/// file, so staleness across invocations in the same compilation isn't a concern in practice.
pub fn parsed_file(path: &Path) -> Result<Arc<syn::File>, AnalyzeError> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    if let Some(hit) = cache().lock().unwrap_or_else(|e| e.into_inner()).get(&canonical) {
        return Ok(Arc::clone(hit));
    }

    let source = std::fs::read_to_string(&canonical).map_err(|e| AnalyzeError::Read {
        path: canonical.display().to_string(),
        reason: e.to_string(),
    })?;
    let parsed = syn::parse_file(&source).map_err(|e| AnalyzeError::Parse {
        path: canonical.display().to_string(),
        reason: e.to_string(),
    })?;
    let parsed = Arc::new(parsed);

    cache()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(canonical, Arc::clone(&parsed));
    Ok(parsed)
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
