// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cache::{CacheConfig, ResultCache};
use crate::notifications::Notifier;
use crate::tracker::CommandTracker;
use dbgx_core::{CommandState, SessionIdGen, SystemClock};
use dbgx_driver::{FakeDebuggerAdapter, FakeNotifyAdapter, ScriptedResponse};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type TestQueue = IsolatedQueue<FakeDebuggerAdapter, FakeNotifyAdapter, SystemClock>;

struct Harness {
    queue: TestQueue,
    driver: FakeDebuggerAdapter,
    notify: FakeNotifyAdapter,
}

async fn setup() -> Harness {
    let session_id = SessionIdGen::new().next();
    let tracker = Arc::new(CommandTracker::new(session_id.clone()));
    let cache = Arc::new(ResultCache::new(CacheConfig::test_default()));
    let driver = FakeDebuggerAdapter::new();
    let notify = FakeNotifyAdapter::new();
    let notifier = Notifier::new(session_id, notify.clone());
    let (queue, ready_rx) = IsolatedQueue::spawn(
        driver.clone(),
        tracker,
        cache,
        notifier,
        SystemClock,
        CancellationToken::new(),
    );
    ready_rx.await.expect("worker reports ready");
    Harness {
        queue,
        driver,
        notify,
    }
}

#[tokio::test]
async fn is_ready_is_true_once_the_worker_has_started() {
    let h = setup().await;
    assert!(h.queue.is_ready());
}

#[tokio::test]
async fn enqueued_commands_behind_a_hung_one_get_sequential_positions() {
    let h = setup().await;
    h.driver.push_response(ScriptedResponse::HangUntilCancelled);

    let a = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.queue.current_command().as_ref(), Some(&a));

    let b = h.queue.enqueue("k");
    let c = h.queue.enqueue("!peb");

    let status = h.queue.status();
    let info_b = status.iter().find(|i| i.id == b).unwrap();
    let info_c = status.iter().find(|i| i.id == c).unwrap();
    assert_eq!(info_b.state, CommandState::Queued);
    assert_eq!(info_b.queue_position, 0);
    assert_eq!(info_c.queue_position, 1);

    h.queue.cancel_all("test teardown");
}

#[tokio::test]
async fn cancelling_a_queued_command_removes_it_and_decrements_later_positions() {
    let h = setup().await;
    h.driver.push_response(ScriptedResponse::HangUntilCancelled);

    let _a = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let b = h.queue.enqueue("k");
    let c = h.queue.enqueue("!peb");

    assert!(h.queue.cancel(&b));

    let status = h.queue.status();
    let info_b = status.iter().find(|i| i.id == b).unwrap();
    let info_c = status.iter().find(|i| i.id == c).unwrap();
    assert_eq!(info_b.state, CommandState::Cancelled);
    assert_eq!(info_c.queue_position, 0);

    h.queue.cancel_all("test teardown");
}

#[tokio::test]
async fn cancelling_the_executing_command_reports_cancelled_not_failed() {
    let h = setup().await;
    h.driver.push_response(ScriptedResponse::HangUntilCancelled);

    let a = h.queue.enqueue("!analyze -v");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(h.queue.cancel(&a));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let info = h.queue.status().into_iter().find(|i| i.id == a).unwrap();
    assert_eq!(info.state, CommandState::Cancelled);
}

#[tokio::test]
async fn successful_execution_is_completed_and_cached() {
    let h = setup().await;
    h.driver
        .push_response(ScriptedResponse::Output("rax=0".to_string()));

    let id = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let info = h.queue.status().into_iter().find(|i| i.id == id).unwrap();
    assert_eq!(info.state, CommandState::Completed);

    let events = h.notify.events();
    assert!(events.iter().any(|e| matches!(
        e,
        dbgx_driver::NotifyEvent::CommandStatus { status, .. } if status == "completed"
    )));
}

#[tokio::test]
async fn a_crashed_child_fails_the_command() {
    let h = setup().await;
    h.driver
        .push_response(ScriptedResponse::Crash("access violation".to_string()));

    let id = h.queue.enqueue("!analyze -v");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let info = h.queue.status().into_iter().find(|i| i.id == id).unwrap();
    assert_eq!(info.state, CommandState::Failed);
}

#[tokio::test]
async fn status_is_ordered_by_enqueue_time() {
    let h = setup().await;
    h.driver.push_response(ScriptedResponse::HangUntilCancelled);

    let a = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let b = h.queue.enqueue("k");
    let c = h.queue.enqueue("!peb");

    let ids: Vec<_> = h.queue.status().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a, b, c]);

    h.queue.cancel_all("test teardown");
}

#[tokio::test]
async fn cancel_all_drains_queued_and_interrupts_the_executing_command() {
    let h = setup().await;
    h.driver.push_response(ScriptedResponse::HangUntilCancelled);

    let a = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let b = h.queue.enqueue("k");

    let affected = h.queue.cancel_all("session closing");
    assert_eq!(affected, 2);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let status = h.queue.status();
    let info_a = status.iter().find(|i| i.id == a).unwrap();
    let info_b = status.iter().find(|i| i.id == b).unwrap();
    assert_eq!(info_a.state, CommandState::Cancelled);
    assert_eq!(info_b.state, CommandState::Cancelled);
}

#[tokio::test]
async fn cancelling_a_terminal_command_returns_false() {
    let h = setup().await;
    h.driver
        .push_response(ScriptedResponse::Output(String::new()));

    let id = h.queue.enqueue("lm");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!h.queue.cancel(&id));
}
