// SPDX-License-Identifier: MIT

use super::*;

fn sample_entry(bytes: Vec<u8>, _fds: Vec<std::os::fd::OwnedFd>) -> Result<Vec<u8>, Vec<u8>> {
    Ok(bytes)
}

inventory::submit! {
    EntryDescriptor {
        signature: "entry-tests-sample",
        entry: sample_entry,
    }
}

#[test]
fn find_locates_a_registered_descriptor_by_signature() {
    let descriptor = find("entry-tests-sample").expect("descriptor should be registered");
    assert_eq!((descriptor.entry)(vec![1, 2, 3], Vec::new()), Ok(vec![1, 2, 3]));
}

#[test]
fn find_returns_none_for_an_unknown_signature() {
    assert!(find("no-such-signature-should-ever-be-registered").is_none());
}
