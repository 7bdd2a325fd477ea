// SPDX-License-Identifier: MIT

//! Process-wide map from [`LocationKey`] to backing [`Segment`] (spec.md §4.I).
//!
//! Two processes that construct a [`crate::Global`] at the same source location compute the
//! same `LocationKey` (see `ispawn_core::LocationKey::segment_name`) and therefore `shm_open`
//! the same named object — no handshake message is needed to give them the same backing pages.
//! Within one process, repeated opens of the same key are memoized so every `Global` at that
//! call site shares one `Arc<Segment>`. Invariant: once a key is bound, its segment is never
//! rebound for the remaining lifetime of the process (spec.md §3).

use crate::error::SharedError;
use crate::segment::Segment;
use ispawn_core::LocationKey;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;
use std::collections::HashMap;
use std::fs::File;
use std::os::fd::OwnedFd;
use std::sync::{Arc, Mutex, OnceLock};

type Cache = Mutex<HashMap<LocationKey, Arc<Segment>>>;

/// The process-wide shared-memory registry. Cheap to clone (it's a unit struct over process
/// statics); construct one with [`Registry::global`].
#[derive(Clone, Copy, Default)]
pub struct Registry;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

impl Registry {
    /// The single process-wide registry instance.
    pub fn global() -> Self {
        Registry
    }

    /// Returns the segment bound to `key`, opening or creating the backing shared-memory object
    /// on first use in this process.
    pub fn get_or_open(&self, key: &LocationKey, len: usize) -> Result<Arc<Segment>, SharedError> {
        self.get_or_open_checked(key, len).map(|(segment, _created)| segment)
    }

    /// As [`Registry::get_or_open`], but also reports whether *this process* is the one that
    /// created the underlying POSIX shared-memory object (as opposed to attaching to one a
    /// sibling process already created). Only the creator should seed the segment's initial
    /// contents — see [`crate::global::Global::new`].
    pub fn get_or_open_checked(
        &self,
        key: &LocationKey,
        len: usize,
    ) -> Result<(Arc<Segment>, bool), SharedError> {
        if let Some(hit) = cache().lock().unwrap_or_else(|e| e.into_inner()).get(key) {
            if hit.len() != len {
                return Err(SharedError::LengthMismatch {
                    key: key.clone(),
                    requested: len,
                    actual: hit.len(),
                });
            }
            return Ok((Arc::clone(hit), false));
        }

        let (segment, created) = open_or_create(key, len)?;
        let segment = Arc::new(segment);
        let mut guard = cache().lock().unwrap_or_else(|e| e.into_inner());
        // Another thread may have raced us between the check above and taking the lock; the
        // loser's mapping is simply dropped, the registry invariant ("never rebind once bound")
        // is preserved because we always return whatever is already in the map.
        let segment = guard.entry(key.clone()).or_insert(segment).clone();
        Ok((segment, created))
    }
}

fn open_or_create(key: &LocationKey, len: usize) -> Result<(Segment, bool), SharedError> {
    let name = key.segment_name();
    let (fd, created) = match shm_open(
        name.as_str(),
        OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
        Mode::S_IRUSR | Mode::S_IWUSR,
    ) {
        Ok(fd) => (fd, true),
        Err(nix::errno::Errno::EEXIST) => {
            let fd = shm_open(name.as_str(), OFlag::O_RDWR, Mode::empty()).map_err(|e| {
                SharedError::Open {
                    key: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            (fd, false)
        }
        Err(e) => {
            return Err(SharedError::Open {
                key: key.clone(),
                reason: e.to_string(),
            })
        }
    };

    if created {
        ftruncate(&fd, len as i64).map_err(|e| {
            let _ = shm_unlink(name.as_str());
            SharedError::Open {
                key: key.clone(),
                reason: format!("ftruncate failed: {e}"),
            }
        })?;
    }

    let mmap = map_shared(fd, len.max(1), key)?;
    tracing::debug!(segment = %name, created, len, "opened shared-memory segment");
    Ok((Segment::shared(mmap, len, name), created))
}

fn map_shared(fd: OwnedFd, len: usize, key: &LocationKey) -> Result<memmap2::MmapMut, SharedError> {
    let file: File = fd.into();
    // SAFETY: `file` backs a `shm_open`/`ftruncate`d POSIX shared-memory object at least `len`
    // bytes long; mutation races on the `::data` range are a documented caller responsibility,
    // exactly as spec.md treats a raw `SharedBuffer`.
    unsafe {
        memmap2::MmapOptions::new()
            .len(len)
            .map_mut(&file)
            .map_err(|e| SharedError::Open {
                key: key.clone(),
                reason: format!("mmap failed: {e}"),
            })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
