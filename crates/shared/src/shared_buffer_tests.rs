// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_buffer_is_zeroed() {
    let buf = SharedBuffer::new(8);
    assert_eq!(buf.len(), 8);
    assert_eq!(buf.read(0, 8), vec![0u8; 8]);
}

#[test]
fn write_then_read_round_trips() {
    let buf = SharedBuffer::new(4);
    buf.write(0, &[1, 2, 3, 4]);
    assert_eq!(buf.read(0, 4), vec![1, 2, 3, 4]);
}

#[test]
fn atomic_accessors_observe_plain_writes() {
    let buf = SharedBuffer::new(4);
    buf.write(0, &42u32.to_ne_bytes());
    assert_eq!(buf.atomic_u32(0).load(std::sync::atomic::Ordering::Acquire), 42);
}

#[test]
fn rebind_swaps_the_backing_segment() {
    let mut buf = SharedBuffer::new(4);
    buf.write(0, &[9, 9, 9, 9]);

    let replacement = Arc::new(Segment::heap(4));
    replacement.write(0, &[1, 2, 3, 4]);
    buf.rebind(Arc::clone(&replacement), None);

    assert_eq!(buf.read(0, 4), vec![1, 2, 3, 4]);
}
