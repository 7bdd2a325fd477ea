// SPDX-License-Identifier: MIT

//! Transferable detection and move-only resource wrappers (spec.md §4.K).
//!
//! Clonability itself is handled at the type level (mapping decision 8: a captured local must be
//! `Serialize + DeserializeOwned` or the macro-generated capture struct simply fails to compile).
//! `Transferable` is the orthogonal concern spec.md §4.K also covers: *which* captured values own
//! a raw OS resource (a file descriptor) that has to move to the worker rather than be copied
//! through the JSON envelope. [`TransferFile`]/[`TransferSocket`] are the only types that hold one;
//! everything else gets the no-op default.
//!
//! [`Transferable`] itself (and `#[derive(Transferable)]`) is for a struct whose fields are known
//! up front, not for the macro-generated capture behind `spawn!` — that capture can hold *any*
//! `Serialize` type the caller's closure happens to borrow, and making `Transferable` a bound on
//! it would force every captured local (a plain `String`, a user's own struct, `Duration`, ...) to
//! implement a trait it has no business implementing. [`encode_with_transferables`] and
//! [`decode_with_transferables`] sidestep that: they piggyback on serde's own recursive field walk
//! (already required for clonability) and let [`TransferFile`]/[`TransferSocket`] hand their
//! descriptor off through a thread-local side channel during `serialize`/`deserialize`, so a
//! capture only needs `Serialize`/`DeserializeOwned` — `Transferable` never enters into it.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

thread_local! {
    /// Descriptors handed off by `TransferFile`/`TransferSocket` values `serde_json` visits while
    /// [`encode_with_transferables`] is running, in visitation order.
    static TRANSFER_OUT: RefCell<Vec<OwnedFd>> = RefCell::new(Vec::new());
    /// Set only while `encode_with_transferables` is on the stack, so a `TransferFile` serialized
    /// from anywhere else (e.g. a job's ordinary result) never dups a descriptor into the void.
    static COLLECTING: Cell<bool> = const { Cell::new(false) };
    /// Descriptors [`decode_with_transferables`] received for the capture currently being
    /// deserialized, consumed in the same order `TRANSFER_OUT` was filled on the sending side.
    static TRANSFER_IN: RefCell<std::vec::IntoIter<OwnedFd>> = RefCell::new(Vec::new().into_iter());
}

/// Serializes `value`, returning its wire bytes alongside every transferable descriptor reachable
/// from it — via serde's own field walk, not a `Transferable` bound on `T` (see module docs).
/// This is what the `spawn!` bridge calls instead of [`collect_transferables`] + [`crate::encode`].
pub fn encode_with_transferables<T: Serialize>(value: &T) -> (Vec<u8>, Vec<OwnedFd>) {
    TRANSFER_OUT.with(|out| out.borrow_mut().clear());
    COLLECTING.with(|flag| flag.set(true));
    let bytes = crate::codec::encode(value);
    COLLECTING.with(|flag| flag.set(false));
    let fds = TRANSFER_OUT.with(|out| out.borrow_mut().drain(..).collect());
    (bytes, fds)
}

/// Deserializes `bytes`, refilling every placeholder `TransferFile`/`TransferSocket` the
/// deserializer encounters from `fds`, in the order [`encode_with_transferables`] drained them.
/// This is what the worker-side bridge calls instead of [`crate::decode`] + [`restore_transferables`].
pub fn decode_with_transferables<T: DeserializeOwned>(bytes: &[u8], fds: Vec<OwnedFd>) -> T {
    TRANSFER_IN.with(|inbox| *inbox.borrow_mut() = fds.into_iter());
    crate::codec::decode(bytes)
}

/// Duplicates an owned descriptor (`dup(2)`) for `TransferFile`/`TransferSocket`'s `Clone` impls.
fn dup_fd(fd: &OwnedFd) -> OwnedFd {
    let raw = nix::unistd::dup(fd.as_raw_fd())
        .expect("ispawn: failed to duplicate a transferable descriptor for capture");
    unsafe { OwnedFd::from_raw_fd(raw) }
}

/// Implemented by every value that can appear in a `spawn!` capture struct. `take` drains any
/// owned file descriptors reachable from `self`, replacing them with an empty/placeholder state —
/// called once, by the macro-generated bridge, before the capture struct is JSON-encoded and sent
/// to the dispatcher, which hands the drained descriptors to the worker as `SCM_RIGHTS` ancillary
/// data over the control channel (`ispawn-transport::fd_passing`) alongside the ordinary job frame.
///
/// `restore` is `take`'s mirror image, run inside the worker: it walks the same value in the same
/// field order and refills each placeholder from `fds`, which must yield descriptors in exactly
/// the order `take` drained them — true as long as both sides visit fields in declaration order,
/// which every impl here does.
pub trait Transferable {
    fn take(&mut self) -> Vec<OwnedFd> {
        Vec::new()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        let _ = fds;
    }
}

/// Drains every transferable fd reachable from `value`. A thin, named wrapper around
/// `Transferable::take` so call sites read as "collect the transferables" rather than a bare
/// `.take()`, matching spec.md §4.F step 4's own vocabulary.
pub fn collect_transferables<T: Transferable>(value: &mut T) -> Vec<OwnedFd> {
    value.take()
}

/// Refills every placeholder `Transferable` reachable from `value`, in declaration order, from
/// descriptors received over the worker's control channel (spec.md §4.H "rehydrates payload").
pub fn restore_transferables<T: Transferable>(value: &mut T, fds: Vec<OwnedFd>) {
    value.restore(&mut fds.into_iter());
}

macro_rules! impl_transferable_noop {
    ($($ty:ty),* $(,)?) => {
        $(impl Transferable for $ty {})*
    };
}

impl_transferable_noop!(
    (),
    bool,
    char,
    String,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);

impl<T: Transferable> Transferable for Option<T> {
    fn take(&mut self) -> Vec<OwnedFd> {
        match self {
            Some(inner) => inner.take(),
            None => Vec::new(),
        }
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        if let Some(inner) = self {
            inner.restore(fds);
        }
    }
}

impl<T: Transferable> Transferable for Box<T> {
    fn take(&mut self) -> Vec<OwnedFd> {
        (**self).take()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        (**self).restore(fds);
    }
}

impl<T: Transferable> Transferable for Vec<T> {
    fn take(&mut self) -> Vec<OwnedFd> {
        self.iter_mut().flat_map(Transferable::take).collect()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        for item in self.iter_mut() {
            item.restore(fds);
        }
    }
}

impl<T: Transferable> Transferable for HashSet<T> {
    fn take(&mut self) -> Vec<OwnedFd> {
        // Sets don't hand out `&mut` to elements; a capture containing fd-bearing set elements
        // isn't meaningfully usable after the fds move out from under it anyway, so this is a
        // documented no-op rather than an unsound workaround.
        let _ = self;
        Vec::new()
    }
}

impl<T: Transferable> Transferable for BTreeSet<T> {
    fn take(&mut self) -> Vec<OwnedFd> {
        let _ = self;
        Vec::new()
    }
}

impl<K, V: Transferable> Transferable for HashMap<K, V> {
    fn take(&mut self) -> Vec<OwnedFd> {
        self.values_mut().flat_map(Transferable::take).collect()
    }

    // No `restore`: a `HashMap`'s iteration order depends on its hasher's per-instance random
    // seed, so the host's drain order and the worker's freshly-deserialized instance have no
    // guaranteed correspondence. A capture containing fd-bearing `HashMap` values needs a
    // `BTreeMap` (whose iteration order is the key order, identical on both sides) instead.
}

impl<K: Ord, V: Transferable> Transferable for BTreeMap<K, V> {
    fn take(&mut self) -> Vec<OwnedFd> {
        self.values_mut().flat_map(Transferable::take).collect()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        for value in self.values_mut() {
            value.restore(fds);
        }
    }
}

macro_rules! impl_transferable_tuple {
    ($($name:ident),+) => {
        impl<$($name: Transferable),+> Transferable for ($($name,)+) {
            #[allow(non_snake_case)]
            fn take(&mut self) -> Vec<OwnedFd> {
                let ($($name,)+) = self;
                let mut fds = Vec::new();
                $(fds.extend(Transferable::take($name));)+
                fds
            }

            #[allow(non_snake_case)]
            fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
                let ($($name,)+) = self;
                $(Transferable::restore($name, fds);)+
            }
        }
    };
}

impl_transferable_tuple!(A);
impl_transferable_tuple!(A, B);
impl_transferable_tuple!(A, B, C);
impl_transferable_tuple!(A, B, C, D);
impl_transferable_tuple!(A, B, C, D, E);
impl_transferable_tuple!(A, B, C, D, E, F);
impl_transferable_tuple!(A, B, C, D, E, F, G);
impl_transferable_tuple!(A, B, C, D, E, F, G, H);

/// A wrapper around an owned file descriptor referring to a regular file, handed to the worker by
/// `SCM_RIGHTS` rather than copied through the JSON envelope.
///
/// Serializes as a placeholder `null` — the descriptor itself never touches the JSON frame, and
/// `deserialize` refills it from whatever [`decode_with_transferables`] received over
/// `ispawn-transport::fd_passing::recv_fds`, in the order it was sent. [`TransferFile::rehydrate`]
/// is the same operation spelled out for callers using [`Transferable::restore`] directly instead.
///
/// `Clone` duplicates the underlying descriptor (`dup(2)`) rather than sharing it: the macro-
/// generated bridge clones every capture before sending it (spec.md's "deep clone round-trip"
/// test expects the caller's own bindings to survive the call unchanged), so a captured
/// `TransferFile` keeps its caller-side fd open and hands the worker a dup of the same underlying
/// open file description — the two fds are distinct numbers but refer to the same file, which is
/// exactly what `SCM_RIGHTS` itself does to whatever fd it's given.
#[derive(Debug, Default)]
pub struct TransferFile(Option<OwnedFd>);

impl Clone for TransferFile {
    fn clone(&self) -> Self {
        Self(self.0.as_ref().map(dup_fd))
    }
}

impl TransferFile {
    pub fn new(fd: OwnedFd) -> Self {
        Self(Some(fd))
    }

    /// Fills in a descriptor received out-of-band, for a value that deserialized as a placeholder.
    pub fn rehydrate(&mut self, fd: OwnedFd) {
        self.0 = Some(fd);
    }

    pub fn as_raw_fd(&self) -> Option<RawFd> {
        self.0.as_ref().map(|fd| fd.as_raw_fd())
    }
}

impl Transferable for TransferFile {
    fn take(&mut self) -> Vec<OwnedFd> {
        self.0.take().into_iter().collect()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        if let Some(fd) = fds.next() {
            self.rehydrate(fd);
        }
    }
}

impl Serialize for TransferFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if COLLECTING.with(Cell::get) {
            if let Some(fd) = &self.0 {
                TRANSFER_OUT.with(|out| out.borrow_mut().push(dup_fd(fd)));
            }
        }
        serializer.serialize_unit()
    }
}

impl<'de> Deserialize<'de> for TransferFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <()>::deserialize(deserializer)?;
        let fd = TRANSFER_IN.with(|inbox| inbox.borrow_mut().next());
        Ok(Self(fd))
    }
}

/// The `UnixStream`-flavored analogue of [`TransferFile`] (spec.md §4.K transferable sockets).
/// `Clone` dups the descriptor for the same reason as [`TransferFile::clone`].
#[derive(Debug, Default)]
pub struct TransferSocket(Option<OwnedFd>);

impl Clone for TransferSocket {
    fn clone(&self) -> Self {
        Self(self.0.as_ref().map(dup_fd))
    }
}

impl TransferSocket {
    pub fn new(fd: OwnedFd) -> Self {
        Self(Some(fd))
    }

    pub fn rehydrate(&mut self, fd: OwnedFd) {
        self.0 = Some(fd);
    }

    pub fn as_raw_fd(&self) -> Option<RawFd> {
        self.0.as_ref().map(|fd| fd.as_raw_fd())
    }
}

impl Transferable for TransferSocket {
    fn take(&mut self) -> Vec<OwnedFd> {
        self.0.take().into_iter().collect()
    }

    fn restore(&mut self, fds: &mut std::vec::IntoIter<OwnedFd>) {
        if let Some(fd) = fds.next() {
            self.rehydrate(fd);
        }
    }
}

impl Serialize for TransferSocket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if COLLECTING.with(Cell::get) {
            if let Some(fd) = &self.0 {
                TRANSFER_OUT.with(|out| out.borrow_mut().push(dup_fd(fd)));
            }
        }
        serializer.serialize_unit()
    }
}

impl<'de> Deserialize<'de> for TransferSocket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <()>::deserialize(deserializer)?;
        let fd = TRANSFER_IN.with(|inbox| inbox.borrow_mut().next());
        Ok(Self(fd))
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
