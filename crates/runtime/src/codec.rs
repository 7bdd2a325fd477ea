// SPDX-License-Identifier: MIT

//! JSON (de)serialization for capture payloads and closure results (spec.md §4.E/§4.K, mapping
//! decision 8: clonability is the `Serialize + DeserializeOwned` bound itself).
//!
//! These are only ever called on bytes this same process produced (or, for `decode`, on bytes a
//! worker produced from a payload this process encoded) — a failure here means the wire protocol
//! itself is corrupted, not a user error, so we panic rather than thread a `Result` through every
//! macro-generated entry function. The worker loop (`ispawn-worker`) wraps every job invocation in
//! `catch_unwind`, so a corrupt frame surfaces as a `JobResponse::Error` instead of crashing the
//! worker process.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;

/// Serializes `value` to JSON bytes.
#[allow(clippy::expect_used)]
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("ispawn-runtime: value captured by spawn! failed to encode")
}

/// Deserializes JSON bytes produced by [`encode`] back into `T`.
#[allow(clippy::expect_used)]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).expect("ispawn-runtime: malformed capture/result payload")
}

/// Turns a `catch_unwind` panic payload into the JSON-encoded message carried by
/// `JobResponse::Error` (spec.md §7.3).
pub fn encode_panic(payload: &Box<dyn Any + Send>) -> Vec<u8> {
    let message = panic_message(payload);
    encode(&message)
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "spawn! closure panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
