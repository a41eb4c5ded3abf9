// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dbgx_core::FakeClock;
use dbgx_driver::{FakeDebuggerAdapter, FakeNotifyAdapter, ScriptedResponse};
use dbgx_engine::{CacheConfig, SessionManagerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

type TestManager = SessionManager<FakeDebuggerAdapter, FakeNotifyAdapter, FakeClock>;

fn build_ctx() -> (Arc<ListenCtx<FakeDebuggerAdapter, FakeNotifyAdapter, FakeClock>>, FakeDebuggerAdapter) {
    build_ctx_with_extensions(true)
}

fn build_ctx_with_extensions(
    extensions_enabled: bool,
) -> (Arc<ListenCtx<FakeDebuggerAdapter, FakeNotifyAdapter, FakeClock>>, FakeDebuggerAdapter) {
    let driver = FakeDebuggerAdapter::new();
    let driver_for_factory = driver.clone();
    let config = SessionManagerConfig {
        max_sessions: 2,
        idle_timeout: Duration::from_secs(3600),
        cache: CacheConfig::test_default(),
    };
    let manager: TestManager = SessionManager::new(
        config,
        Arc::new(move || driver_for_factory.clone()),
        FakeNotifyAdapter::new(),
        FakeClock::new(),
    );
    (
        Arc::new(ListenCtx {
            sessions: Arc::new(manager),
            extensions_enabled,
        }),
        driver,
    )
}

async fn open_a_session(
    ctx: &ListenCtx<FakeDebuggerAdapter, FakeNotifyAdapter, FakeClock>,
    dump_file: &NamedTempFile,
) -> String {
    let response = dispatch(
        ctx,
        Request::OpenSession {
            dump_path: dump_file.path().to_path_buf(),
            symbols_path: None,
        },
    )
    .await;
    match response {
        Response::OpenSession {
            session_id, status, ..
        } => {
            assert_eq!(status, "Success");
            session_id
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

async fn wait_until_terminal(
    ctx: &ListenCtx<FakeDebuggerAdapter, FakeNotifyAdapter, FakeClock>,
    session_id: &str,
    command_id: &str,
) -> Response {
    for _ in 0..200 {
        let response = dispatch(
            ctx,
            Request::ReadCommandResult {
                session_id: session_id.to_string(),
                command_id: command_id.to_string(),
            },
        )
        .await;
        if let Response::ReadCommandResult { ref status, .. } = response {
            if status != "Queued" && status != "Executing" {
                return response;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("command {command_id} never reached a terminal state");
}

#[tokio::test]
async fn open_session_reports_success_for_an_existing_dump_file() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;
    assert!(session_id.starts_with("sess-"));
}

#[tokio::test]
async fn open_session_reports_failed_for_a_missing_dump_file() {
    let (ctx, _driver) = build_ctx();
    let response = dispatch(
        &ctx,
        Request::OpenSession {
            dump_path: PathBuf::from("/no/such/file.dmp"),
            symbols_path: None,
        },
    )
    .await;
    match response {
        Response::OpenSession { status, message, .. } => {
            assert_eq!(status, "Failed");
            assert!(message.contains("Dump file does not exist"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn close_session_is_idempotent() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let first = dispatch(
        &ctx,
        Request::CloseSession {
            session_id: session_id.clone(),
        },
    )
    .await;
    assert!(matches!(first, Response::CloseSession { ref status, .. } if status == "Success"));

    let second = dispatch(&ctx, Request::CloseSession { session_id }).await;
    assert!(matches!(second, Response::CloseSession { ref status, .. } if status == "Failed"));
}

#[tokio::test]
async fn enqueue_command_rejects_malformed_session_id() {
    let (ctx, _driver) = build_ctx();
    let response = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id: "not-a-session".to_string(),
            command: "lm".to_string(),
        },
    )
    .await;
    assert!(matches!(response, Response::Error { ref kind, .. } if kind == "SessionNotFound"));
}

#[tokio::test]
async fn enqueue_command_rejects_empty_text() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id,
            command: "   ".to_string(),
        },
    )
    .await;
    assert!(matches!(response, Response::Error { ref kind, .. } if kind == "InvalidInput"));
}

#[tokio::test]
async fn enqueue_command_reports_queue_position_and_timeout() {
    let (ctx, driver) = build_ctx();
    driver.push_response(ScriptedResponse::HangUntilCancelled);
    driver.push_response(ScriptedResponse::Output("child threads".to_string()));
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let first = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id: session_id.clone(),
            command: "lm".to_string(),
        },
    )
    .await;
    let Response::EnqueueCommand { timeout_minutes, .. } = first else {
        panic!("unexpected response: {first:?}");
    };
    assert_eq!(timeout_minutes, 2);

    let second = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id,
            command: "!threads".to_string(),
        },
    )
    .await;
    match second {
        Response::EnqueueCommand {
            status,
            queue_position,
            total_in_queue,
            ..
        } => {
            assert_eq!(status, "Queued");
            assert_eq!(queue_position, 1);
            assert_eq!(total_in_queue, 1);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn read_command_result_errors_for_unknown_command_id() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::ReadCommandResult {
            session_id: session_id.clone(),
            command_id: format!("cmd-{}-ffff", &session_id["sess-".len()..]),
        },
    )
    .await;
    assert!(matches!(response, Response::Error { ref kind, .. } if kind == "CommandNotFound"));
}

#[tokio::test]
async fn read_command_result_errors_for_malformed_command_id() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::ReadCommandResult {
            session_id,
            command_id: "not-a-command".to_string(),
        },
    )
    .await;
    assert!(matches!(response, Response::Error { ref kind, .. } if kind == "InvalidInput"));
}

#[tokio::test]
async fn read_command_result_returns_output_once_completed() {
    let (ctx, driver) = build_ctx();
    driver.push_response(ScriptedResponse::Output("module list".to_string()));
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let enqueue = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id: session_id.clone(),
            command: "lm".to_string(),
        },
    )
    .await;
    let Response::EnqueueCommand { command_id, .. } = enqueue else {
        panic!("unexpected response: {enqueue:?}");
    };

    let response = wait_until_terminal(&ctx, &session_id, &command_id).await;
    match response {
        Response::ReadCommandResult {
            status,
            result,
            progress,
            ..
        } => {
            assert_eq!(status, "Success");
            assert_eq!(result.as_deref(), Some("module list"));
            assert_eq!(progress.progress_percentage, 100);
            assert_eq!(progress.check_again, "no need to poll again");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn read_command_result_returns_error_on_crash() {
    let (ctx, driver) = build_ctx();
    driver.push_response(ScriptedResponse::Crash("access violation".to_string()));
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let enqueue = dispatch(
        &ctx,
        Request::EnqueueCommand {
            session_id: session_id.clone(),
            command: "lm".to_string(),
        },
    )
    .await;
    let Response::EnqueueCommand { command_id, .. } = enqueue else {
        panic!("unexpected response: {enqueue:?}");
    };

    let response = wait_until_terminal(&ctx, &session_id, &command_id).await;
    match response {
        Response::ReadCommandResult { status, error, .. } => {
            assert_eq!(status, "Failed");
            assert!(error.unwrap().contains("access violation"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn enqueue_extension_returns_a_queued_job_with_the_flat_timeout() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::EnqueueExtension {
            session_id: session_id.clone(),
            extension_name: "!wdbgark.findbadobjects".to_string(),
            parameters: None,
        },
    )
    .await;
    match response {
        Response::EnqueueExtension {
            command_id,
            status,
            timeout_minutes,
            ..
        } => {
            assert!(command_id.starts_with("ext-"));
            assert_eq!(status, "Queued");
            assert_eq!(timeout_minutes, 30);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn enqueue_extension_rejects_empty_name() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::EnqueueExtension {
            session_id,
            extension_name: "".to_string(),
            parameters: None,
        },
    )
    .await;
    assert!(matches!(response, Response::Error { ref kind, .. } if kind == "InvalidInput"));
}

#[tokio::test]
async fn enqueue_extension_fails_when_the_subsystem_is_disabled() {
    let (ctx, _driver) = build_ctx_with_extensions(false);
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let response = dispatch(
        &ctx,
        Request::EnqueueExtension {
            session_id,
            extension_name: "!wdbgark.findbadobjects".to_string(),
            parameters: None,
        },
    )
    .await;
    assert!(
        matches!(response, Response::Error { ref kind, .. } if kind == "ExtensionSubsystemDisabled")
    );
}

#[tokio::test]
async fn read_command_result_reports_queued_extension_job() {
    let (ctx, _driver) = build_ctx();
    let dump_file = NamedTempFile::new().unwrap();
    let session_id = open_a_session(&ctx, &dump_file).await;

    let enqueue = dispatch(
        &ctx,
        Request::EnqueueExtension {
            session_id: session_id.clone(),
            extension_name: "!handle".to_string(),
            parameters: None,
        },
    )
    .await;
    let Response::EnqueueExtension { command_id, .. } = enqueue else {
        panic!("unexpected response: {enqueue:?}");
    };

    let response = dispatch(
        &ctx,
        Request::ReadCommandResult {
            session_id,
            command_id,
        },
    )
    .await;
    match response {
        Response::ReadCommandResult {
            status, progress, ..
        } => {
            assert_eq!(status, "Queued");
            assert_eq!(progress.progress_percentage, 0);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}
