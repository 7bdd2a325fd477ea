// SPDX-License-Identifier: MIT

//! The process-wide registry of macro-generated worker entry functions (spec.md §4.D, "Worker
//! entry registry"). Each `spawn!` call site `inventory::submit!`s one [`EntryDescriptor`] at the
//! point it's defined; because a pooled worker is a re-exec of the very binary that compiled those
//! `inventory::submit!` calls, the registry is already fully populated by the time
//! `ispawn_worker::run_if_worker` looks anything up — no generated source file, no import
//! rewriting, matching mapping decision 3 in `SPEC_FULL.md`.

/// One `spawn!` call site's generated entry point, registered at compile time.
pub struct EntryDescriptor {
    /// The call site's signature digest (`CallSite::digest`), used as the pool/registry key and
    /// propagated to the worker via `ISPAWN_SIGNATURE`.
    pub signature: &'static str,
    /// Decodes the JSON-encoded capture payload, refills any transferables it carries from `fds`
    /// (received over the worker's control channel, in the same order the host drained them),
    /// runs the closure under `catch_unwind`, and returns `Ok(encoded result)` or
    /// `Err(encoded panic message)`.
    pub entry: fn(Vec<u8>, Vec<std::os::fd::OwnedFd>) -> Result<Vec<u8>, Vec<u8>>,
}

inventory::collect!(EntryDescriptor);

/// Looks up the entry registered for `signature`, if any.
pub fn find(signature: &str) -> Option<&'static EntryDescriptor> {
    inventory::iter::<EntryDescriptor>()
        .into_iter()
        .find(|descriptor| descriptor.signature == signature)
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
