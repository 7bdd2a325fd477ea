// SPDX-License-Identifier: MIT

//! Location-keyed cross-process identity for a shared primitive (spec.md §4.I "Global").
//!
//! `Global::new(inner)` is the Rust analogue of the original design's `Global(Mutex(...))`
//! nesting: `inner` is built as an ordinary, process-local value (its own heap-backed
//! [`crate::Segment`]s), and wrapping it in `Global::new` is what gives it a stable identity —
//! the call site is captured with `#[track_caller]`, hashed into a [`ispawn_core::LocationKey`],
//! and used to open (or create) the backing named shared-memory segment(s). Two processes that
//! evaluate `Global::new` at the same source location — the common case, since a pooled worker
//! re-execs the very binary that declared the `static` — always rebind to the same pages.

use crate::error::SharedError;
use crate::registry::Registry;
use crate::segment::Segment;
use ispawn_core::{CallSite, LocationKey, SubKey};
use std::ops::{Deref, DerefMut};
use std::panic::Location;
use std::sync::Arc;

/// Implemented by the primitives [`crate::Global`] can wrap: [`crate::Mutex`] and
/// [`crate::Semaphore`]. Exposes the process-local segments a freshly constructed value is
/// backed by, and lets `Global::new` swap them for registry-backed ones.
pub trait Rebindable {
    /// The state segment (and, if any, the data segment) this value is currently backed by.
    fn segments(&self) -> (Arc<Segment>, Option<Arc<Segment>>);
    /// Replace the backing segments, e.g. with ones opened from the shared-memory registry.
    fn rebind(&mut self, state: Arc<Segment>, data: Option<Arc<Segment>>);
}

/// A [`Rebindable`] value with cross-process identity derived from its `Global::new` call site.
pub struct Global<T> {
    inner: T,
    call_site: CallSite,
}

impl<T: Rebindable> Global<T> {
    /// Captures the call site, opens (or creates) its backing shared-memory segment(s), and
    /// rebinds `inner` onto them. The first process to evaluate a given call site seeds the
    /// segment's contents from whatever `inner` held locally (e.g. a `Semaphore`'s initial
    /// permit count); every other process attaches to the existing, already-live contents.
    #[track_caller]
    pub fn new(mut inner: T) -> Result<Self, SharedError> {
        let location = Location::caller();
        let call_site = CallSite::new(location.file(), location.line(), location.column());

        let (local_state, local_data) = inner.segments();
        let state_key =
            LocationKey::new(call_site.file.clone(), call_site.line, call_site.column, SubKey::State);

        let (state, created) = Registry::global().get_or_open_checked(&state_key, local_state.len())?;
        if created {
            state.write(0, &local_state.read(0, local_state.len()));
        }

        let data = match local_data {
            Some(local_data) => {
                let data_key = state_key.data_key();
                let (data, created) =
                    Registry::global().get_or_open_checked(&data_key, local_data.len())?;
                if created {
                    data.write(0, &local_data.read(0, local_data.len()));
                }
                Some(data)
            }
            None => None,
        };

        inner.rebind(state, data);
        Ok(Self { inner, call_site })
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }
}

impl<T> Deref for Global<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Global<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
#[path = "global_tests.rs"]
mod tests;
