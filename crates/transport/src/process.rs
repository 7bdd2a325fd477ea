// SPDX-License-Identifier: MIT

//! Provisions a worker "isolate" as a freshly re-exec'd child process (spec.md §4.H, §5).
//!
//! Each worker is a child of `std::env::current_exe()` with `ISPAWN_SIGNATURE` set so that
//! `ispawn_worker::run_if_worker()` (called at the top of the user's own `main()`) recognizes
//! it should enter the job loop instead of running the program's normal entry point.

use crate::error::TransportError;
use ispawn_core::Signature;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use tokio::io::{BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Environment variable carrying the raw fd number of the worker's end of the transferable
/// control channel, read back by `ispawn-worker` at startup.
pub const FD_CHANNEL_VAR: &str = "ISPAWN_FD_CHANNEL";

/// A running worker process: its stdio pipes (framed job messages) plus the paired control
/// channel `ispawn-transport::fd_passing` uses to hand over transferable file descriptors.
pub struct WorkerProcess {
    pub child: Child,
    pub stdin: BufWriter<ChildStdin>,
    pub stdout: BufReader<ChildStdout>,
    pub control: UnixStream,
}

/// Spawns a new worker bound to `signature`.
///
/// `ISPAWN_LOG_DIR`, if the caller has set one, is inherited unchanged — the worker decides its
/// own log file name from the signature digest (spec.md §4.D).
pub fn spawn_worker(signature: &Signature) -> Result<WorkerProcess, TransportError> {
    let exe = std::env::current_exe().map_err(TransportError::Spawn)?;
    let (parent_control, child_control) =
        UnixStream::pair().map_err(|e| TransportError::FdPassing(e.to_string()))?;
    // `UnixStream::pair` sets `CLOEXEC` on both ends; clear it on the child's so it survives the
    // upcoming `exec` instead of being silently closed.
    clear_cloexec(&child_control)?;

    let mut command = Command::new(exe);
    command
        .env("ISPAWN_SIGNATURE", signature.call_site.digest())
        .env(FD_CHANNEL_VAR, child_control.as_raw_fd().to_string())
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::inherit())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(TransportError::Spawn)?;
    // The child inherited its own copy of `child_control` across `fork`; this process's copy
    // would otherwise keep the pipe half-open even after the worker exits.
    drop(child_control);

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| TransportError::Spawn(std::io::Error::other("worker stdin not piped")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| TransportError::Spawn(std::io::Error::other("worker stdout not piped")))?;

    Ok(WorkerProcess {
        child,
        stdin: BufWriter::new(stdin),
        stdout: BufReader::new(stdout),
        control: parent_control,
    })
}

fn clear_cloexec(stream: &UnixStream) -> Result<(), TransportError> {
    let fd = stream.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFD).map_err(|e| TransportError::FdPassing(e.to_string()))?;
    let mut flags = FdFlag::from_bits_truncate(flags);
    flags.remove(FdFlag::FD_CLOEXEC);
    fcntl(fd, FcntlArg::F_SETFD(flags)).map_err(|e| TransportError::FdPassing(e.to_string()))?;
    Ok(())
}

impl WorkerProcess {
    /// Requests a graceful shutdown by closing stdin, then waits up to `timeout` before killing.
    pub async fn terminate(mut self, timeout: std::time::Duration) -> Result<(), TransportError> {
        drop(self.stdin);
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Io(e)),
            Err(_) => {
                tracing::warn!("worker did not exit within {:?}, killing", timeout);
                self.child.kill().await.map_err(TransportError::Io)
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
