// SPDX-License-Identifier: MIT

//! End-to-end scenarios, run against real re-exec'd worker processes (spec.md §8).
//!
//! This binary doubles as its own worker: a `#[ctor]` constructor calls
//! [`ispawn_worker::run_if_worker`] before libtest's own `main` runs, so when
//! `ispawn-transport::spawn_worker` re-execs `current_exe()` with `ISPAWN_SIGNATURE` set, the
//! child immediately enters the job loop instead of parsing test-harness arguments. The same
//! pattern is used by `paritytech-polkadot-sdk`'s `ctor`-based process setup.

use ispawn::spawn;
use serde::{Deserialize, Serialize};

#[ctor::ctor]
fn enter_worker_mode_if_applicable() {
    ispawn_worker::run_if_worker();
}

#[tokio::test]
async fn spawn_runs_a_closure_in_a_worker_and_returns_its_result() {
    let a = 4i32;
    let b = 5i32;
    let sum = spawn!(move || a + b).await.unwrap();
    assert_eq!(sum, 9);

    let pid = spawn!(move || std::process::id()).await.unwrap();
    assert_ne!(pid, std::process::id(), "closure should run in a child process, not the host");
}

#[tokio::test]
async fn spawn_deep_clones_captured_structures_rather_than_sharing_them() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Report {
        rows: Vec<i32>,
    }

    let mut report = Report { rows: vec![1, 2, 3] };
    let captured = report.clone();
    let doubled = spawn!(move || {
        let mut r = captured;
        r.rows.iter_mut().for_each(|row| *row *= 2);
        r
    })
    .await
    .unwrap();

    // The worker's mutation never touches the host's copy — it ran on an independent clone.
    report.rows.push(4);
    assert_eq!(doubled.rows, vec![2, 4, 6]);
    assert_eq!(report.rows, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn spawn_surfaces_a_panicking_closure_as_a_job_failed_error() {
    let result: Result<i32, _> = spawn!(move || -> i32 { panic!("deliberate failure") }).await;
    let err = result.unwrap_err();
    match err {
        ispawn::SpawnError::JobFailed { message, .. } => {
            assert_eq!(message, "deliberate failure");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_calls_at_the_same_call_site_reuse_a_pooled_worker_process() {
    async fn call_site_pid() -> u32 {
        spawn!(move || std::process::id()).await.unwrap()
    }

    let first = call_site_pid().await;
    let second = call_site_pid().await;
    let third = call_site_pid().await;

    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[tokio::test]
async fn chained_spawn_calls_at_distinct_call_sites_each_get_their_own_worker_process() {
    let outer_input = 10i32;
    let outer_pid = spawn!(move || (std::process::id(), outer_input * 2)).await.unwrap();
    let (outer_worker_pid, outer_result) = outer_pid;

    let inner_input = outer_result;
    let inner_pid = spawn!(move || (std::process::id(), inner_input + 1)).await.unwrap();
    let (inner_worker_pid, inner_result) = inner_pid;

    assert_eq!(inner_result, 21);
    assert_ne!(outer_worker_pid, std::process::id());
    assert_ne!(inner_worker_pid, std::process::id());
}
