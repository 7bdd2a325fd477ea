// SPDX-License-Identifier: MIT

//! The error taxonomy for `spawn!` and the shared primitives (spec.md §7).

use crate::call_site::CallSite;
use thiserror::Error;

/// Everything that can go wrong between calling `spawn!` and the returned future resolving.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("could not resolve captures for closure at {call_site}: {reason}")]
    CaptureResolution { call_site: CallSite, reason: String },

    #[error("value of type '{type_name}' captured at {call_site} is not serializable: {reason}")]
    PayloadEncode {
        call_site: CallSite,
        type_name: String,
        reason: String,
    },

    #[error("closure at {call_site} panicked: {message}")]
    JobFailed { call_site: CallSite, message: String },

    #[error("worker process for {call_site} could not be started or communicated with: {reason}")]
    WorkerIo { call_site: CallSite, reason: String },

    #[error("worker process for {call_site} terminated before returning a result")]
    WorkerTerminated { call_site: CallSite },

    #[error("shared primitive at {call_site} could not be opened: {reason}")]
    SharedPrimitive { call_site: CallSite, reason: String },
}

impl SpawnError {
    pub fn call_site(&self) -> &CallSite {
        match self {
            Self::CaptureResolution { call_site, .. }
            | Self::PayloadEncode { call_site, .. }
            | Self::JobFailed { call_site, .. }
            | Self::WorkerIo { call_site, .. }
            | Self::WorkerTerminated { call_site }
            | Self::SharedPrimitive { call_site, .. } => call_site,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
