// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn display_includes_sub_key() {
    let key = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    assert_eq!(key.to_string(), "src/main.rs:5:9::state");
}

#[test]
fn data_key_preserves_location_but_changes_sub() {
    let state = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    let data = state.data_key();
    assert_eq!(data.sub, SubKey::Data);
    assert_eq!(data.file, state.file);
    assert_eq!(data.line, state.line);
    assert_eq!(data.column, state.column);
}

#[test]
fn segment_name_is_stable_for_identical_keys() {
    let a = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    let b = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    assert_eq!(a.segment_name(), b.segment_name());
}

#[test]
fn segment_name_distinguishes_state_from_data() {
    let state = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    let data = state.data_key();
    assert_ne!(state.segment_name(), data.segment_name());
}

#[yare::parameterized(
    different_line   = { LocationKey::new("src/main.rs", 6, 9, SubKey::State) },
    different_column = { LocationKey::new("src/main.rs", 5, 10, SubKey::State) },
    different_file   = { LocationKey::new("src/lib.rs", 5, 9, SubKey::State) },
)]
fn segment_name_differs_when_any_field_differs(other: LocationKey) {
    let base = LocationKey::new("src/main.rs", 5, 9, SubKey::State);
    assert_ne!(base.segment_name(), other.segment_name());
}

#[test]
fn location_key_round_trips_through_json() {
    let key = LocationKey::new("src/main.rs", 5, 9, SubKey::Data);
    let json = serde_json::to_string(&key).unwrap();
    let parsed: LocationKey = serde_json::from_str(&json).unwrap();
    assert_eq!(key, parsed);
}
