// SPDX-License-Identifier: MIT

//! Errors raised while re-parsing a source file or locating a `spawn!` call within it.

use ispawn_core::CallSite;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("could not read source file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("could not parse '{path}' as Rust source: {reason}")]
    Parse { path: String, reason: String },

    #[error("no spawn! invocation found near {call_site}")]
    MacroNotFound { call_site: CallSite },

    #[error("spawn! at {call_site} does not wrap a closure expression")]
    NotAClosure { call_site: CallSite },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
