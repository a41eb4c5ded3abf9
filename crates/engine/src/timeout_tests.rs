// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dbgx_core::SessionIdGen;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn cmd_id() -> CommandId {
    let sid = SessionIdGen::new().next();
    CommandId::new(&sid, 1)
}

#[tokio::test]
async fn fires_after_the_duration_elapses() {
    let svc = TimeoutService::new();
    let fired = Arc::new(AtomicBool::new(false));
    let id = cmd_id();

    let fired_clone = fired.clone();
    svc.arm(id.clone(), Duration::from_millis(10), async move {
        fired_clone.store(true, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fired.load(Ordering::SeqCst));
    assert!(!svc.is_armed(&id));
}

#[tokio::test]
async fn cancel_prevents_the_callback_from_running() {
    let svc = TimeoutService::new();
    let fired = Arc::new(AtomicBool::new(false));
    let id = cmd_id();

    let fired_clone = fired.clone();
    svc.arm(id.clone(), Duration::from_millis(30), async move {
        fired_clone.store(true, Ordering::SeqCst);
    });
    svc.cancel(&id);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let svc = TimeoutService::new();
    let id = cmd_id();
    svc.cancel(&id);
    svc.cancel(&id);
}

#[tokio::test]
async fn rearming_replaces_the_previous_timer() {
    let svc = TimeoutService::new();
    let first_fired = Arc::new(AtomicBool::new(false));
    let second_fired = Arc::new(AtomicBool::new(false));
    let id = cmd_id();

    let first = first_fired.clone();
    svc.arm(id.clone(), Duration::from_millis(20), async move {
        first.store(true, Ordering::SeqCst);
    });

    let second = second_fired.clone();
    svc.arm(id.clone(), Duration::from_millis(20), async move {
        second.store(true, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!first_fired.load(Ordering::SeqCst));
    assert!(second_fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn armed_count_tracks_outstanding_timers() {
    let svc = TimeoutService::new();
    assert_eq!(svc.armed_count(), 0);
    let id = cmd_id();
    svc.arm(id.clone(), Duration::from_secs(10), async {});
    assert_eq!(svc.armed_count(), 1);
    svc.cancel(&id);
    assert_eq!(svc.armed_count(), 0);
}
