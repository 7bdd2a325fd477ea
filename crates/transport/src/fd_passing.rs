// SPDX-License-Identifier: MIT

//! Passing transferable file descriptors (`TransferFile`/`TransferSocket`) alongside a job,
//! using `SCM_RIGHTS` ancillary data over a `UnixStream` control channel (spec.md §4.K).
//!
//! The JSON job frame never carries raw fds — only a placeholder index — so this is a second,
//! parallel channel dedicated to handing off ownership of the descriptors themselves.

use crate::error::TransportError;
use nix::sys::socket::{self, ControlMessage, ControlMessageOwned, MsgFlags};
use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

/// Sends `fds`, each wrapped so the receiver can reclaim ownership, over `channel`.
///
/// A single null byte rides in the regular (non-ancillary) payload because `sendmsg` requires
/// at least one byte of real data to carry control messages on most platforms.
pub fn send_fds(channel: &UnixStream, fds: &[OwnedFd]) -> Result<(), TransportError> {
    let borrowed: Vec<BorrowedFd<'_>> = fds.iter().map(|fd| fd.as_fd()).collect();
    let cmsg = [ControlMessage::ScmRights(
        &borrowed.iter().map(|fd| fd.as_raw_fd()).collect::<Vec<_>>(),
    )];
    let iov = [IoSlice::new(&[0u8])];
    socket::sendmsg::<()>(channel.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
        .map_err(|e| TransportError::FdPassing(e.to_string()))?;
    Ok(())
}

/// Receives up to `max_fds` descriptors sent by [`send_fds`] on `channel`.
pub fn recv_fds(channel: &UnixStream, max_fds: usize) -> Result<Vec<OwnedFd>, TransportError> {
    let mut cmsg_buf = nix::cmsg_space!([std::os::fd::RawFd; 32]);
    let mut data = [0u8; 1];
    let mut iov = [IoSliceMut::new(&mut data)];

    let message = socket::recvmsg::<()>(
        channel.as_raw_fd(),
        &mut iov,
        Some(&mut cmsg_buf),
        MsgFlags::empty(),
    )
    .map_err(|e| TransportError::FdPassing(e.to_string()))?;

    let mut received = Vec::new();
    for cmsg in message.cmsgs().map_err(|e| TransportError::FdPassing(e.to_string()))? {
        if let ControlMessageOwned::ScmRights(raw_fds) = cmsg {
            for raw in raw_fds.into_iter().take(max_fds) {
                // SAFETY: `raw` was just handed to us by the kernel via SCM_RIGHTS and is not
                // owned anywhere else yet.
                received.push(unsafe { OwnedFd::from_raw_fd(raw) });
            }
        }
    }
    Ok(received)
}

#[cfg(test)]
#[path = "fd_passing_tests.rs"]
mod tests;
