// SPDX-License-Identifier: MIT

//! The resolved shape of one `spawn!` call, combining its [`CallSite`] with the captured-locals
//! list `ispawn-analyzer` computed for it (spec.md §4.C/§4.D).
//!
//! `ispawn-macros` builds a [`Signature`] once per call site at macro-expansion time and embeds
//! it (as a const-evaluable literal) in the generated entry function's [`inventory`] submission,
//! so the worker process can look up "what was captured here" without re-running analysis.

use crate::call_site::CallSite;
use serde::{Deserialize, Serialize};

/// Captured-locals shape of a single `spawn!` closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub call_site: CallSite,
    /// Names of the locals captured, in declaration order — this is also the field order of
    /// the generated capture struct, so it doubles as the struct's serialization layout.
    pub captured: Vec<String>,
}

impl Signature {
    pub fn new(call_site: CallSite, captured: Vec<String>) -> Self {
        Self { call_site, captured }
    }

    pub fn arity(&self) -> usize {
        self.captured.len()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
