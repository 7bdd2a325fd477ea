// SPDX-License-Identifier: MIT

//! Transport-layer errors: everything that can go wrong moving bytes between host and worker,
//! as opposed to the job-level failures captured in `ispawn_core::SpawnError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn worker process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("i/o error on worker transport: {0}")]
    Io(#[source] std::io::Error),

    #[error("worker closed its stdout before a full message was read")]
    UnexpectedEof,

    #[error("message frame of {0} bytes exceeds the {1}-byte limit")]
    FrameTooLarge(u32, u32),

    #[error("fd-passing over the control channel failed: {0}")]
    FdPassing(String),
}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        TransportError::Io(value)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
