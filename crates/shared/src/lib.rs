// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Location-keyed shared memory and the primitives built on top of it (spec.md §4.I, §4.J).
//!
//! `Segment` is a block of memory addressable by every process that opens the same
//! [`ispawn_core::LocationKey`] — backed by named POSIX shared memory when wrapped in
//! [`Global`], or by a process-local heap allocation when used standalone. [`Mutex`] and
//! [`Semaphore`] are built on top of a `Segment`'s atomic words; [`SharedBuffer`] exposes a
//! `Segment`'s bytes directly, with no synchronization word of its own. [`Global`] is what gives
//! any of the three cross-process identity by rebinding it to the registry the first time a
//! given source location is evaluated in each process.

pub mod error;
pub mod global;
pub mod mutex;
pub mod registry;
pub mod segment;
pub mod semaphore;
pub mod shared_buffer;
pub mod wait;

pub use error::SharedError;
pub use global::Global;
pub use mutex::{Mutex, MutexGuard};
pub use registry::Registry;
pub use segment::Segment;
pub use semaphore::{Semaphore, SemaphoreGuard};
pub use shared_buffer::SharedBuffer;
