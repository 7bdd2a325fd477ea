// SPDX-License-Identifier: MIT

//! A counting semaphore whose permit count lives in a [`Segment`] (spec.md §4.J "Semaphore").
//!
//! Fairness is unspecified, same as spec.md §4.J/§9: waiters compete on wake, no FIFO ordering
//! is guaranteed. `acquire`/`release` are allowed to move the count transiently above the
//! configured initial value if a caller releases more than it acquired — spec.md §9 leaves this
//! unconstrained and this port does not add a ceiling check.

use crate::global::Rebindable;
use crate::segment::Segment;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub struct Semaphore {
    state: Arc<Segment>,
}

impl Semaphore {
    pub fn new(initial_permits: i32) -> Self {
        let state = Segment::heap(4);
        state.atomic_i32(0).store(initial_permits, Ordering::Release);
        Self {
            state: Arc::new(state),
        }
    }

    /// Acquires `n` permits, suspending while fewer than `n` are available.
    pub async fn acquire(&self, n: i32) -> SemaphoreGuard<'_> {
        loop {
            let current = self.state.atomic_i32(0).load(Ordering::Acquire);
            if current >= n
                && self
                    .state
                    .atomic_i32(0)
                    .compare_exchange(current, current - n, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                return SemaphoreGuard {
                    semaphore: self,
                    permits: n,
                    released: false,
                };
            }
            crate::wait::wait_i32_until(self.state.atomic_i32(0), |value| value >= n).await;
        }
    }

    /// Releases `n` permits back to the semaphore without going through a guard (e.g. to
    /// replenish permits that were never paired with an `acquire` in this process).
    pub fn release(&self, n: i32) {
        self.state.atomic_i32(0).fetch_add(n, Ordering::AcqRel);
        // Notification is implicit: every waiter's poll re-reads the word above.
    }

    pub fn available_permits(&self) -> i32 {
        self.state.atomic_i32(0).load(Ordering::Acquire)
    }
}

impl Rebindable for Semaphore {
    fn segments(&self) -> (Arc<Segment>, Option<Arc<Segment>>) {
        (Arc::clone(&self.state), None)
    }

    fn rebind(&mut self, state: Arc<Segment>, _data: Option<Arc<Segment>>) {
        self.state = state;
    }
}

/// A scoped token for `n` acquired permits; releases them back on disposal, idempotently.
pub struct SemaphoreGuard<'a> {
    semaphore: &'a Semaphore,
    permits: i32,
    released: bool,
}

impl SemaphoreGuard<'_> {
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.semaphore.release(self.permits);
        }
    }
}

impl Drop for SemaphoreGuard<'_> {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
