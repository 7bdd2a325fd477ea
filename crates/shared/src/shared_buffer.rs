// SPDX-License-Identifier: MIT

//! A raw byte buffer with no synchronization word of its own (spec.md §1/§3 "raw shared buffer").
//!
//! Unlike [`crate::Mutex`] and [`crate::Semaphore`], `SharedBuffer` holds no state word — its
//! bytes are a user-synchronized contract from the start, exactly as spec.md's `::data` buffers
//! are described once a lock has already changed hands. Standalone (`SharedBuffer::new`) it is
//! backed by process-local heap memory; wrap it in [`crate::Global`] to give it cross-process
//! identity.

use crate::global::Rebindable;
use crate::segment::Segment;
use std::sync::atomic::{AtomicI32, AtomicU32};
use std::sync::Arc;

/// A fixed-length buffer, shared across processes once wrapped in [`crate::Global`].
pub struct SharedBuffer {
    segment: Arc<Segment>,
}

impl SharedBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            segment: Arc::new(Segment::heap(len)),
        }
    }

    pub fn len(&self) -> usize {
        self.segment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }

    /// Copies `len` bytes starting at `offset` out of the buffer.
    pub fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        self.segment.read(offset, len)
    }

    /// Overwrites `bytes.len()` bytes starting at `offset`.
    pub fn write(&self, offset: usize, bytes: &[u8]) {
        self.segment.write(offset, bytes)
    }

    /// Borrow 4 bytes at `offset` as an `AtomicU32`, for callers that want to coordinate without
    /// a `Mutex`. Panics if `offset + 4 > len()`.
    pub fn atomic_u32(&self, offset: usize) -> &AtomicU32 {
        self.segment.atomic_u32(offset)
    }

    /// Borrow 4 bytes at `offset` as an `AtomicI32`. Panics if `offset + 4 > len()`.
    pub fn atomic_i32(&self, offset: usize) -> &AtomicI32 {
        self.segment.atomic_i32(offset)
    }
}

impl Rebindable for SharedBuffer {
    fn segments(&self) -> (Arc<Segment>, Option<Arc<Segment>>) {
        (Arc::clone(&self.segment), None)
    }

    fn rebind(&mut self, state: Arc<Segment>, _data: Option<Arc<Segment>>) {
        self.segment = state;
    }
}

#[cfg(test)]
#[path = "shared_buffer_tests.rs"]
mod tests;
