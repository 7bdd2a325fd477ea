// SPDX-License-Identifier: MIT

//! The wire protocol between `ispawn-runtime`'s dispatcher and `ispawn-worker`'s job loop
//! (spec.md §6), framed by `ispawn-transport::framing` and tagged like the teacher's `oj-wire`
//! enums so a `tracing` log of raw frames stays self-describing.

use serde::{Deserialize, Serialize};

/// One job handed to a worker: the signature digest it was pooled under, plus the JSON-encoded
/// capture struct. `props` is already-serialized bytes rather than a generic `T`, since a worker
/// process has no type information about the closure that produced them — only the matching
/// `EntryDescriptor`, looked up by `signature`, knows how to decode them.
/// `transferable_count` tells the worker how many descriptors to expect on the control channel
/// (`ispawn-transport::fd_passing`) before it can decode `props` into a usable capture struct —
/// zero means the dispatcher skipped the control channel entirely for this job (spec.md §4.K).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobMessage {
    Run {
        signature: String,
        props: Vec<u8>,
        transferable_count: usize,
    },
}

/// A worker's reply to exactly one [`JobMessage::Run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobResponse {
    Success { result: Vec<u8> },
    Error { error: String },
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
