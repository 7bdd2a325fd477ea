// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn wait_u32_while_returns_immediately_if_already_changed() {
    let word = AtomicU32::new(0);
    tokio::time::timeout(Duration::from_millis(50), wait_u32_while(&word, 1))
        .await
        .expect("should not have to wait at all");
}

#[tokio::test]
async fn wait_u32_while_wakes_once_another_task_changes_the_word() {
    let word = Arc::new(AtomicU32::new(1));
    let writer = Arc::clone(&word);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        writer.store(0, Ordering::Release);
    });

    tokio::time::timeout(Duration::from_secs(1), wait_u32_while(&word, 1))
        .await
        .expect("waiter should observe the write within the timeout");
}

#[tokio::test]
async fn wait_i32_until_respects_predicate() {
    let word = AtomicI32::new(-5);
    tokio::time::timeout(Duration::from_millis(50), wait_i32_until(&word, |v| v < 0))
        .await
        .expect("predicate already satisfied");
}
