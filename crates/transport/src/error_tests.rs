// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn io_error_converts_via_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
    let err: TransportError = io_err.into();
    assert!(matches!(err, TransportError::Io(_)));
}

#[test]
fn frame_too_large_reports_both_sizes() {
    let err = TransportError::FrameTooLarge(100, 64);
    assert!(err.to_string().contains("100"));
    assert!(err.to_string().contains("64"));
}
