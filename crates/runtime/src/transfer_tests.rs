// SPDX-License-Identifier: MIT

use super::*;
use std::os::fd::FromRawFd;

fn dummy_fd() -> OwnedFd {
    // A duplicate of stdin's fd, just so we have something `OwnedFd` can own without opening a
    // real file; closed when dropped like any other descriptor.
    let raw = nix::unistd::dup(0).unwrap();
    unsafe { OwnedFd::from_raw_fd(raw) }
}

#[test]
fn scalar_and_string_captures_have_no_transferables() {
    let mut value = (1i32, "hi".to_string(), 3.5f64);
    assert!(value.take().is_empty());
}

#[test]
fn transfer_file_yields_its_descriptor_exactly_once() {
    let mut file = TransferFile::new(dummy_fd());
    let fds = file.take();
    assert_eq!(fds.len(), 1);
    assert!(file.take().is_empty());
}

#[test]
fn collect_transferables_walks_into_a_vec_and_an_option() {
    let mut captured = (vec![TransferFile::new(dummy_fd()), TransferFile::new(dummy_fd())], Some(TransferFile::new(dummy_fd())));
    let fds = collect_transferables(&mut captured);
    assert_eq!(fds.len(), 3);
}

#[test]
fn transfer_file_serializes_as_a_json_null_placeholder() {
    let file = TransferFile::new(dummy_fd());
    let bytes = serde_json::to_vec(&file).unwrap();
    assert_eq!(bytes, b"null");
}

#[test]
fn transfer_file_rehydrates_after_a_placeholder_deserialize() {
    let mut file: TransferFile = serde_json::from_slice(b"null").unwrap();
    assert!(file.as_raw_fd().is_none());
    file.rehydrate(dummy_fd());
    assert!(file.as_raw_fd().is_some());
}

#[test]
fn restore_refills_placeholders_in_the_same_order_take_drained_them() {
    let mut captured = (vec![TransferFile::new(dummy_fd()), TransferFile::new(dummy_fd())], Some(TransferFile::new(dummy_fd())));
    let fds = collect_transferables(&mut captured);
    assert!(captured.0[0].as_raw_fd().is_none());
    assert!(captured.0[1].as_raw_fd().is_none());
    assert!(captured.1.as_ref().unwrap().as_raw_fd().is_none());

    restore_transferables(&mut captured, fds);
    assert!(captured.0[0].as_raw_fd().is_some());
    assert!(captured.0[1].as_raw_fd().is_some());
    assert!(captured.1.as_ref().unwrap().as_raw_fd().is_some());
}

/// A capture type with no `Transferable` impl at all — this is exactly what the macro-generated
/// bridge hands to `encode_with_transferables`/`decode_with_transferables` for an ordinary
/// `Serialize`/`Deserialize` user struct captured by a `spawn!` closure.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
struct PlainCapture {
    name: String,
    count: u32,
}

#[test]
fn encode_with_transferables_round_trips_a_type_with_no_transferable_impl() {
    let value = PlainCapture {
        name: "report".to_string(),
        count: 7,
    };
    let (bytes, fds) = encode_with_transferables(&value);
    assert!(fds.is_empty());

    let decoded: PlainCapture = decode_with_transferables(&bytes, fds);
    assert_eq!(decoded, value);
}

#[test]
fn encode_with_transferables_collects_a_transfer_file_nested_in_a_tuple() {
    let captured = (PlainCapture { name: "x".to_string(), count: 1 }, TransferFile::new(dummy_fd()));
    let (bytes, fds) = encode_with_transferables(&captured);
    assert_eq!(fds.len(), 1);
    // The caller's own `TransferFile` still owns its descriptor — `encode_with_transferables`
    // dups it rather than draining it in place, unlike the `Transferable::take` path.
    assert!(captured.1.as_raw_fd().is_some());

    let (decoded_plain, decoded_file): (PlainCapture, TransferFile) =
        decode_with_transferables(&bytes, fds);
    assert_eq!(decoded_plain.count, 1);
    assert!(decoded_file.as_raw_fd().is_some());
}

#[test]
fn serializing_a_transfer_file_outside_of_encode_with_transferables_drops_its_descriptor() {
    // Matches the pre-existing placeholder behavior for e.g. a job result that happens to embed
    // a `TransferFile`: no collection is in flight, so nothing is pushed anywhere, and the
    // descriptor is simply not carried across (spec.md §4.K only promises transfer for captures
    // routed through the `spawn!` bridge, not for arbitrary result payloads).
    let file = TransferFile::new(dummy_fd());
    let bytes = serde_json::to_vec(&file).unwrap();
    assert_eq!(bytes, b"null");
}
