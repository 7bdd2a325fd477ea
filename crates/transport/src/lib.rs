// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Process provisioning and the framed wire protocol between host and worker (spec.md §6).
//!
//! Wire format: 4-byte big-endian length prefix + JSON payload over the worker's stdin/stdout,
//! the same shape this codebase already uses for its daemon IPC. Transferable resources ride
//! alongside on a paired `UnixStream` as `SCM_RIGHTS` ancillary data.

pub mod error;
pub mod fd_passing;
pub mod framing;
pub mod process;

pub use error::TransportError;
pub use fd_passing::{recv_fds, send_fds};
pub use framing::{read_message, write_message};
pub use process::{spawn_worker, WorkerProcess, FD_CHANNEL_VAR};
