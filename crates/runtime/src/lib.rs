// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ispawn-runtime: the host-side half of the isolate-spawning bridge (spec.md §4.D/E/F/G/K).
//!
//! `ispawn-macros`' generated code is the only intended caller of most of this crate's public
//! surface — [`decode`], [`encode`], [`encode_panic`], [`EntryDescriptor`], [`inventory`],
//! `transfer::encode_with_transferables`, `transfer::decode_with_transferables`, and
//! [`spawn_dispatch`] are the exact names `crates/macros/src/expand.rs` emits references to.

pub mod codec;
pub mod dispatch;
pub mod entry;
pub mod pool;
pub mod transfer;

pub use codec::{decode, encode, encode_panic};
pub use dispatch::spawn_dispatch;
pub use entry::EntryDescriptor;
pub use pool::WorkerPool;
pub use transfer::{collect_transferables, restore_transferables};
pub use transfer::{decode_with_transferables, encode_with_transferables};

/// Re-exported so the macro-generated bridge can write `::ispawn_runtime::inventory::submit!`
/// without `ispawn-macros` itself depending on the `inventory` crate.
pub use inventory;
