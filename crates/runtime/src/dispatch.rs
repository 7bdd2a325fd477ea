// SPDX-License-Identifier: MIT

//! Dispatch entry (spec.md §4.F): the async function the `spawn!` bridge actually calls.

use crate::{codec, pool};
use ispawn_core::{CallSite, JobResponse, Signature, SpawnError};
use serde::de::DeserializeOwned;
use std::os::fd::OwnedFd;

/// Sends `props` (the JSON-encoded capture struct) and `fds` (any transferables collected from it
/// by [`crate::transfer::encode_with_transferables`]) to a pooled worker for `signature`, and
/// decodes its response as `R`.
///
/// Matches spec.md §4.F steps 2–7: the process-wide [`pool::global`] pool provisions or reuses a
/// worker, marks it busy for the duration of the call, and rearms its idle-eviction timer once the
/// response comes back — win or lose. Step 1 (dropping non-local captures) is handled upstream, by
/// the macro-generated capture struct, before `props` ever reaches here.
pub async fn spawn_dispatch<R: DeserializeOwned>(
    signature: Signature,
    props: Vec<u8>,
    fds: Vec<OwnedFd>,
) -> Result<R, SpawnError> {
    let call_site = signature.call_site.clone();
    let response = pool::global()
        .run(signature, props, fds)
        .await
        .map_err(|reason| ispawn_core::SpawnError::WorkerIo {
            call_site: call_site.clone(),
            reason: reason.to_string(),
        })?;

    interpret_response(call_site, response)
}

/// Turns the worker's reply into the future's `Result`. Split out from [`spawn_dispatch`] so it
/// can be exercised directly — testing the dispatcher end-to-end would mean actually spawning a
/// worker process, which is `ispawn-specs`' job, not a unit test's.
fn interpret_response<R: DeserializeOwned>(
    call_site: CallSite,
    response: JobResponse,
) -> Result<R, SpawnError> {
    match response {
        JobResponse::Success { result } => Ok(codec::decode(&result)),
        JobResponse::Error { error } => Err(SpawnError::JobFailed {
            call_site,
            message: error,
        }),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
