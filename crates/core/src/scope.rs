// SPDX-License-Identifier: MIT

//! Lexical scope classification for free variables (spec.md §4.C, "Scope analysis").
//!
//! `ispawn-analyzer` walks the enclosing source file around a `spawn!` call and partitions
//! every free identifier the closure references into one of the buckets below. `ispawn-macros`
//! only needs [`ScopeDescriptor::locals`] — the identifiers that must be captured and serialized
//! into the worker's payload — but keeps `top_levels` and `globals` around for diagnostics and
//! for the `Non-goals` carve-out that rejects closures capturing `top_levels` items that are not
//! themselves `Clone`.

use serde::{Deserialize, Serialize};

/// The bucket a free identifier resolves to, relative to a `spawn!` call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Bound by an enclosing `let`, function parameter, or closure parameter — must be
    /// captured and serialized into the worker's payload.
    Local,
    /// A `static`, `const`, `fn`, or `struct`/`enum` item at module scope — re-resolved by
    /// name inside the worker process rather than captured by value.
    TopLevel,
    /// Resolves outside the current crate entirely (a prelude item, an external crate path).
    /// Never captured; always re-resolved by name.
    Global,
}

/// One free identifier found in a `spawn!` closure body, tagged with its resolved scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeVariable {
    pub name: String,
    pub kind: ScopeKind,
}

/// The full partition of free variables referenced by one `spawn!` closure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    pub locals: Vec<String>,
    pub top_levels: Vec<String>,
    pub globals: Vec<String>,
}

impl ScopeDescriptor {
    pub fn from_variables(vars: impl IntoIterator<Item = FreeVariable>) -> Self {
        let mut descriptor = ScopeDescriptor::default();
        for var in vars {
            match var.kind {
                ScopeKind::Local => descriptor.locals.push(var.name),
                ScopeKind::TopLevel => descriptor.top_levels.push(var.name),
                ScopeKind::Global => descriptor.globals.push(var.name),
            }
        }
        descriptor
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.top_levels.is_empty() && self.globals.is_empty()
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
