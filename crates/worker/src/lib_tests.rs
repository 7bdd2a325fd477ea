// SPDX-License-Identifier: MIT

use super::*;
use ispawn_core::JobResponse;

fn succeeding(_: Vec<u8>, _: Vec<std::os::fd::OwnedFd>) -> Result<Vec<u8>, Vec<u8>> {
    Ok(ispawn_runtime::encode(&7i32))
}

fn failing(_: Vec<u8>, _: Vec<std::os::fd::OwnedFd>) -> Result<Vec<u8>, Vec<u8>> {
    Err(ispawn_runtime::encode(&"job exploded".to_string()))
}

fn panicking(_: Vec<u8>, _: Vec<std::os::fd::OwnedFd>) -> Result<Vec<u8>, Vec<u8>> {
    panic!("decode corrupted capture payload");
}

#[test]
fn run_entry_returns_success_for_an_ok_entry() {
    let descriptor: &'static EntryDescriptor = Box::leak(Box::new(EntryDescriptor {
        signature: "succeeding",
        entry: succeeding,
    }));

    let response = run_entry(descriptor, Vec::new(), Vec::new());
    match response {
        JobResponse::Success { result } => {
            let value: i32 = ispawn_runtime::decode(&result);
            assert_eq!(value, 7);
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[test]
fn run_entry_carries_through_a_job_level_error() {
    let descriptor: &'static EntryDescriptor = Box::leak(Box::new(EntryDescriptor {
        signature: "failing",
        entry: failing,
    }));

    let response = run_entry(descriptor, Vec::new(), Vec::new());
    match response {
        JobResponse::Error { error } => assert_eq!(error, "job exploded"),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn run_entry_catches_a_panic_escaping_the_entry_fn() {
    let descriptor: &'static EntryDescriptor = Box::leak(Box::new(EntryDescriptor {
        signature: "panicking",
        entry: panicking,
    }));

    let response = run_entry(descriptor, Vec::new(), Vec::new());
    match response {
        JobResponse::Error { error } => assert_eq!(error, "decode corrupted capture payload"),
        other => panic!("expected Error, got {other:?}"),
    }
}
