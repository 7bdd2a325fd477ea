// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Static source analysis backing `spawn!`: re-parses the file a `spawn!` call lives in, finds
//! the matching macro invocation, and classifies every free variable the closure references.
//!
//! `ispawn-macros` is the only caller — it runs at macro-expansion time, inside `rustc`, where
//! there is no type information to lean on, so everything here works over raw `syn` syntax
//! trees instead.

pub mod cache;
pub mod error;
pub mod scope;

pub use cache::parsed_file;
pub use error::AnalyzeError;
pub use scope::locate_spawn_macro;
