// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ispawn-core: shared domain types for the isolate-spawning runtime.
//!
//! Nothing in this crate touches a filesystem, a child process, or a syscall — it is the
//! vocabulary every other `ispawn-*` crate shares: call sites, location keys, signatures, and
//! the error taxonomy from spec.md §7.

pub mod call_site;
pub mod config;
pub mod error;
pub mod hardware;
pub mod location_key;
pub mod message;
pub mod scope;
pub mod signature;

pub use call_site::CallSite;
pub use config::Config;
pub use error::SpawnError;
pub use hardware::{FakeHardware, HardwareInfo, SystemHardware};
pub use location_key::{LocationKey, SubKey};
pub use message::{JobMessage, JobResponse};
pub use scope::ScopeDescriptor;
pub use signature::Signature;
