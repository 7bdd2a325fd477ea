// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ispawn-worker: the re-exec'd worker process's entry point (spec.md §4.H, §5).
//!
//! User binaries call [`run_if_worker`] as the very first line of `main()`. It inspects
//! `ISPAWN_SIGNATURE` (set by `ispawn-transport::spawn_worker` on every pooled child) and, if
//! present, never returns — the process becomes a one-job-at-a-time job loop for the rest of its
//! life. If the variable is absent, `main()` proceeds exactly as it would without `ispawn` linked
//! in at all.

use ispawn_core::JobMessage;
use ispawn_runtime::EntryDescriptor;
use ispawn_transport::TransportError;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use tokio::io::{stdin, stdout, BufReader, BufWriter};

const SIGNATURE_VAR: &str = "ISPAWN_SIGNATURE";
const LOG_DIR_VAR: &str = "ISPAWN_LOG_DIR";

/// Enters the worker job loop and never returns if `ISPAWN_SIGNATURE` is set; otherwise returns
/// immediately so the caller's normal `main()` can proceed.
pub fn run_if_worker() {
    let Ok(signature) = std::env::var(SIGNATURE_VAR) else {
        return;
    };

    init_logging(&signature);

    #[allow(clippy::expect_used)] // a worker process that can't build its own runtime can't work at all
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("ispawn-worker: failed to start its single-threaded runtime");

    let control = open_control_channel();
    let exit_code = runtime.block_on(job_loop(&signature, control));
    std::process::exit(exit_code);
}

/// Opens this worker's end of the transferable control channel from the fd number
/// `ispawn-transport::spawn_worker` left in `ISPAWN_FD_CHANNEL`. Absent or malformed, transferable
/// props simply won't rehydrate — the rest of the job loop degrades gracefully.
fn open_control_channel() -> Option<UnixStream> {
    let raw: RawFd = std::env::var(ispawn_transport::FD_CHANNEL_VAR).ok()?.parse().ok()?;
    // SAFETY: the host cleared `CLOEXEC` on exactly this fd before `exec`, so it is valid and
    // owned solely by this process for the lifetime of the worker.
    Some(unsafe { OwnedFd::from_raw_fd(raw) }.into())
}

async fn job_loop(signature: &str, control: Option<UnixStream>) -> i32 {
    let Some(descriptor) = ispawn_runtime::entry::find(signature) else {
        tracing::error!(signature, "no registered entry matches this worker's signature");
        return 1;
    };

    let mut input = BufReader::new(stdin());
    let mut output = BufWriter::new(stdout());

    loop {
        let frame = match ispawn_transport::read_message(&mut input).await {
            Ok(frame) => frame,
            Err(TransportError::UnexpectedEof) => {
                tracing::debug!(signature, "host closed stdin, shutting down");
                return 0;
            }
            Err(error) => {
                tracing::error!(signature, %error, "error reading job frame");
                return 1;
            }
        };

        let message: JobMessage = match serde_json::from_slice(&frame) {
            Ok(message) => message,
            Err(error) => {
                tracing::error!(signature, %error, "malformed job message");
                return 1;
            }
        };
        let JobMessage::Run {
            props,
            transferable_count,
            ..
        } = message;

        let fds = match recv_transferables(control.as_ref(), transferable_count).await {
            Ok(fds) => fds,
            Err(error) => {
                tracing::error!(signature, %error, "failed receiving transferable descriptors");
                return 1;
            }
        };

        let response = run_entry(descriptor, props, fds);
        let response_bytes = match serde_json::to_vec(&response) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!(signature, %error, "failed encoding job response");
                return 1;
            }
        };

        if let Err(error) = ispawn_transport::write_message(&mut output, &response_bytes).await {
            tracing::error!(signature, %error, "failed writing job response");
            return 1;
        }
    }
}

/// Receives `count` transferable descriptors over `control`, or an empty list if `count` is zero
/// or no control channel was set up (spec.md §4.H).
async fn recv_transferables(
    control: Option<&UnixStream>,
    count: usize,
) -> Result<Vec<OwnedFd>, TransportError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let Some(control) = control else {
        return Err(TransportError::FdPassing(
            "job carries transferables but no control channel was set up".to_string(),
        ));
    };
    let control = control
        .try_clone()
        .map_err(|e| TransportError::FdPassing(e.to_string()))?;
    tokio::task::spawn_blocking(move || ispawn_transport::recv_fds(&control, count))
        .await
        .map_err(|e| TransportError::FdPassing(e.to_string()))?
}

/// Invokes the registered entry, with an outer `catch_unwind` as defense-in-depth against a panic
/// in `ispawn_runtime::decode` itself (corrupted props) rather than in the user's closure body —
/// the closure's own panics are already caught inside `descriptor.entry` and come back as `Err`.
fn run_entry(descriptor: &'static EntryDescriptor, props: Vec<u8>, fds: Vec<OwnedFd>) -> ispawn_core::JobResponse {
    let outcome =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (descriptor.entry)(props, fds)));
    match outcome {
        Ok(Ok(result)) => ispawn_core::JobResponse::Success { result },
        Ok(Err(message_bytes)) => ispawn_core::JobResponse::Error {
            error: ispawn_runtime::decode(&message_bytes),
        },
        Err(payload) => ispawn_core::JobResponse::Error {
            error: ispawn_runtime::decode(&ispawn_runtime::encode_panic(&payload)),
        },
    }
}

/// Worker logging goes to a per-signature file under `ISPAWN_LOG_DIR` (default
/// `$TMPDIR/ispawn`) rather than stderr, since stderr is inherited from a potentially
/// unrelated parent process and several workers may be writing concurrently.
fn init_logging(signature: &str) {
    let dir = std::env::var_os(LOG_DIR_VAR)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("ispawn"));

    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{signature}.log")))
    else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
