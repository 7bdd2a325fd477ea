// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn job_message_round_trips_through_json() {
    let message = JobMessage::Run {
        signature: "deadbeef".to_string(),
        props: vec![1, 2, 3],
        transferable_count: 2,
    };
    let bytes = serde_json::to_vec(&message).unwrap();
    let decoded: JobMessage = serde_json::from_slice(&bytes).unwrap();
    match decoded {
        JobMessage::Run {
            signature,
            props,
            transferable_count,
        } => {
            assert_eq!(signature, "deadbeef");
            assert_eq!(props, vec![1, 2, 3]);
            assert_eq!(transferable_count, 2);
        }
    }
}

#[test]
fn job_response_tags_success_and_error_distinctly() {
    let success = serde_json::to_string(&JobResponse::Success { result: vec![9] }).unwrap();
    let error = serde_json::to_string(&JobResponse::Error {
        error: "boom".to_string(),
    })
    .unwrap();
    assert!(success.contains("\"type\":\"Success\""));
    assert!(error.contains("\"type\":\"Error\""));
}
