// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn arity_matches_captured_len() {
    let sig = Signature::new(
        CallSite::new("src/main.rs", 10, 17),
        vec!["a".into(), "b".into(), "c".into()],
    );
    assert_eq!(sig.arity(), 3);
}

#[test]
fn signature_round_trips_through_json() {
    let sig = Signature::new(CallSite::new("src/main.rs", 10, 17), vec!["counter".into()]);
    let json = serde_json::to_string(&sig).unwrap();
    let parsed: Signature = serde_json::from_str(&json).unwrap();
    assert_eq!(sig, parsed);
}
