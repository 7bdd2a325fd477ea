// SPDX-License-Identifier: MIT

use super::*;

fn site() -> CallSite {
    CallSite::new("src/main.rs", 12, 5)
}

#[test]
fn interpret_response_decodes_a_successful_result() {
    let result: i32 = interpret_response(site(), JobResponse::Success {
        result: codec::encode(&42i32),
    })
    .unwrap();
    assert_eq!(result, 42);
}

#[test]
fn interpret_response_turns_an_error_response_into_job_failed() {
    let err = interpret_response::<i32>(
        site(),
        JobResponse::Error {
            error: "boom".to_string(),
        },
    )
    .unwrap_err();
    match err {
        SpawnError::JobFailed { message, .. } => assert_eq!(message, "boom"),
        other => panic!("expected JobFailed, got {other:?}"),
    }
}
