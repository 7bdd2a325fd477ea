// SPDX-License-Identifier: MIT

//! Atomic wait/notify, realized as a bounded exponential-backoff poll (spec.md §4.J,
//! §9 mapping decision 7).
//!
//! A genuine cross-process futex wake would need an `eventfd` handed across the `exec()`
//! boundary; this port accepts the simpler polling wait instead, since spec.md already
//! disclaims wake fairness for both primitives. "Notify" is therefore a no-op: whichever waiter
//! next polls and sees the word change proceeds.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::time::Duration;

const INITIAL_DELAY: Duration = Duration::from_micros(200);
const MAX_DELAY: Duration = Duration::from_millis(20);

/// Polls `word` until it no longer equals `unwanted`, sleeping with exponential backoff between
/// attempts (capped at [`MAX_DELAY`]).
pub async fn wait_u32_while(word: &AtomicU32, unwanted: u32) {
    let mut delay = INITIAL_DELAY;
    while word.load(Ordering::Acquire) == unwanted {
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Polls `word`, sleeping with backoff, until `predicate` returns `true` for its current value.
pub async fn wait_i32_until(word: &AtomicI32, predicate: impl Fn(i32) -> bool) {
    let mut delay = INITIAL_DELAY;
    while !predicate(word.load(Ordering::Acquire)) {
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
