// SPDX-License-Identifier: MIT

use super::*;
use ispawn_core::{LocationKey, SubKey};

#[test]
fn not_locked_has_a_stable_message() {
    let err = SharedError::NotLocked;
    assert_eq!(err.to_string(), "attempted to release a mutex that was not locked");
}

#[test]
fn length_mismatch_mentions_both_lengths() {
    let key = LocationKey::new("src/main.rs", 1, 1, SubKey::State);
    let err = SharedError::LengthMismatch {
        key,
        requested: 8,
        actual: 4,
    };
    let message = err.to_string();
    assert!(message.contains('8'));
    assert!(message.contains('4'));
}
