// SPDX-License-Identifier: MIT

//! # ispawn
//!
//! Runs an inline closure in a freshly provisioned worker process and awaits its result as an
//! ordinary future:
//!
//! ```ignore
//! ispawn_worker::run_if_worker(); // first line of main()
//!
//! let path = "/tmp/report.csv".to_string();
//! let report = ispawn::spawn!(move || generate_report(&path)).await?;
//! ```
//!
//! Every local captured by the closure must be `Serialize + DeserializeOwned`; values of the
//! enclosing binary's own types, locks, sockets or threads do not cross the process boundary
//! implicitly. Cross-isolate shared state is opt-in, via [`Global`] wrapping a [`Mutex`] or
//! [`Semaphore`]:
//!
//! ```ignore
//! static COUNTER: std::sync::OnceLock<ispawn::Global<ispawn::Mutex>> = std::sync::OnceLock::new();
//! let counter = COUNTER.get_or_init(|| ispawn::Global::new(ispawn::Mutex::new(4)).unwrap());
//! let guard = counter.lock().await;
//! ```
//!
//! Call [`shutdown`] once at program exit to terminate every pooled worker gracefully; without it
//! idle workers still self-evict after [`ispawn_core::Config::idle_timeout`], but the final batch
//! is reaped only by the OS when the host process exits.

pub use ispawn_core::{CallSite, Config, SpawnError};
pub use ispawn_macros::{spawn, Transferable};
pub use ispawn_runtime::transfer::{TransferFile, TransferSocket, Transferable};
pub use ispawn_shared::{
    Global, Mutex, MutexGuard, Semaphore, SemaphoreGuard, SharedBuffer, SharedError,
};
pub use ispawn_worker::run_if_worker;

/// Terminates every pooled worker process, awaiting each one's graceful exit before killing it
/// (spec.md §6). Safe to call more than once; a pool with nothing provisioned is a no-op.
pub async fn shutdown() {
    ispawn_runtime::pool::global().shutdown().await;
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
