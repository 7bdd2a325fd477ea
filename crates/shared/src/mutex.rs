// SPDX-License-Identifier: MIT

//! A mutex whose state word lives in a [`Segment`] (spec.md §4.J "Mutex").
//!
//! Not reentrant: a task that takes its own lock twice deadlocks, by design (spec.md §4.J).
//! Standalone (`Mutex::new`) it is backed by process-local heap memory, good enough for
//! single-process use or tests; wrap it in [`crate::Global`] to give it cross-process identity.

use crate::error::SharedError;
use crate::global::Rebindable;
use crate::segment::Segment;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// A mutex guarding an optional user-data buffer, backed by shared or process-local memory.
pub struct Mutex {
    state: Arc<Segment>,
    data: Option<Arc<Segment>>,
}

impl Mutex {
    /// `data_len` is the size in bytes of the protected payload buffer; `0` means the mutex
    /// guards nothing but its own state word.
    pub fn new(data_len: usize) -> Self {
        Self {
            state: Arc::new(Segment::heap(4)),
            data: (data_len > 0).then(|| Arc::new(Segment::heap(data_len))),
        }
    }

    /// Acquires the lock, suspending (via [`crate::wait`]'s backoff poll) while it is held
    /// elsewhere.
    pub async fn lock(&self) -> MutexGuard<'_> {
        loop {
            if self
                .state
                .atomic_u32(0)
                .compare_exchange(UNLOCKED, LOCKED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return MutexGuard {
                    mutex: self,
                    released: false,
                };
            }
            crate::wait::wait_u32_while(self.state.atomic_u32(0), LOCKED).await;
        }
    }

    /// Releases the lock. Fatal (panics) if it was not held — spec.md §4.J/§7.5 treat this as an
    /// invariant violation, not a recoverable error. Use [`Mutex::try_release`] for a
    /// `Result`-returning alternative.
    #[allow(clippy::expect_used)]
    fn release(&self) {
        self.try_release().expect("released a mutex that was not locked");
    }

    /// As [`Mutex::release`], but returns [`SharedError::NotLocked`] instead of panicking.
    pub fn try_release(&self) -> Result<(), SharedError> {
        self.state
            .atomic_u32(0)
            .compare_exchange(LOCKED, UNLOCKED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| SharedError::NotLocked)
        // Notification is implicit: the next waiter's poll observes the word above.
    }

    /// Byte length of the protected data buffer, `0` if none was configured.
    pub fn data_len(&self) -> usize {
        self.data.as_ref().map(|d| d.len()).unwrap_or(0)
    }
}

impl Rebindable for Mutex {
    fn segments(&self) -> (Arc<Segment>, Option<Arc<Segment>>) {
        (Arc::clone(&self.state), self.data.clone())
    }

    fn rebind(&mut self, state: Arc<Segment>, data: Option<Arc<Segment>>) {
        self.state = state;
        self.data = data;
    }
}

/// A one-shot, idempotent token proving exclusive access to a [`Mutex`]'s protected buffer.
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
    released: bool,
}

impl MutexGuard<'_> {
    /// Read-only view of the protected data buffer (empty if the mutex guards no buffer).
    pub fn data(&self) -> Vec<u8> {
        match &self.mutex.data {
            Some(segment) => segment.read(0, segment.len()),
            None => Vec::new(),
        }
    }

    /// Overwrites the protected data buffer.
    pub fn write_data(&mut self, bytes: &[u8]) {
        if let Some(segment) = &self.mutex.data {
            segment.write(0, bytes);
        }
    }

    /// Releases the lock. Idempotent: calling this more than once (or dropping after calling
    /// it) is a no-op.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.mutex.release();
        }
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
