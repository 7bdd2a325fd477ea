// SPDX-License-Identifier: MIT

use super::*;

fn site() -> CallSite {
    CallSite::new("src/main.rs", 10, 17)
}

#[test]
fn call_site_extracts_from_every_variant() {
    let errors = vec![
        SpawnError::CaptureResolution {
            call_site: site(),
            reason: "ambiguous binding".into(),
        },
        SpawnError::PayloadEncode {
            call_site: site(),
            type_name: "std::net::TcpStream".into(),
            reason: "not Serialize".into(),
        },
        SpawnError::JobFailed {
            call_site: site(),
            message: "index out of bounds".into(),
        },
        SpawnError::WorkerIo {
            call_site: site(),
            reason: "broken pipe".into(),
        },
        SpawnError::WorkerTerminated { call_site: site() },
        SpawnError::SharedPrimitive {
            call_site: site(),
            reason: "shm_open failed".into(),
        },
    ];

    for error in errors {
        assert_eq!(error.call_site(), &site());
    }
}

#[test]
fn display_includes_call_site() {
    let error = SpawnError::JobFailed {
        call_site: site(),
        message: "boom".into(),
    };
    assert!(error.to_string().contains("src/main.rs:10:17"));
    assert!(error.to_string().contains("boom"));
}
