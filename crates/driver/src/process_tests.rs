// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_adapter() -> ProcessDebuggerAdapter {
    let mut config = ProcessDriverConfig::default();
    config.idle_timeout = Duration::from_secs(5);
    ProcessDebuggerAdapter::new(config)
}

#[tokio::test]
async fn accumulates_stdout_and_stops_at_sentinel() {
    let adapter = test_adapter();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(ChildLine::Stdout("child 0 ffff".to_string())).unwrap();
    tx.send(ChildLine::Stdout("rax=0000000000000000".to_string()))
        .unwrap();
    tx.send(ChildLine::Stdout(adapter.sentinel.to_string()))
        .unwrap();

    let output = adapter.read_until_sentinel(&mut rx, None).await.unwrap();
    assert_eq!(output, "child 0 ffff\nrax=0000000000000000\n");
}

#[tokio::test]
async fn stderr_lines_are_prefixed() {
    let adapter = test_adapter();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(ChildLine::Stderr("unresolved symbol".to_string()))
        .unwrap();
    tx.send(ChildLine::Stdout(adapter.sentinel.to_string()))
        .unwrap();

    let output = adapter.read_until_sentinel(&mut rx, None).await.unwrap();
    assert_eq!(output, "[STDERR] unresolved symbol\n");
}

#[tokio::test]
async fn sentinel_with_leading_whitespace_is_still_recognised() {
    let adapter = test_adapter();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(ChildLine::Stdout(format!("  {}", adapter.sentinel)))
        .unwrap();

    let output = adapter.read_until_sentinel(&mut rx, None).await.unwrap();
    assert_eq!(output, "");
}

#[tokio::test]
async fn exit_before_sentinel_is_child_crashed() {
    let adapter = test_adapter();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(ChildLine::Exited).unwrap();

    let err = adapter.read_until_sentinel(&mut rx, None).await.unwrap_err();
    assert!(matches!(err, DriverError::ChildCrashed(_)));
    assert!(!adapter.is_active().await);
}

#[tokio::test]
async fn cancellation_token_short_circuits_the_read() {
    let adapter = test_adapter();
    let (_tx, mut rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    token.cancel();

    let err = adapter
        .read_until_sentinel(&mut rx, Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Cancelled));
}

#[tokio::test]
async fn idle_timeout_fires_when_no_line_arrives() {
    let mut config = ProcessDriverConfig::default();
    config.idle_timeout = Duration::from_millis(20);
    let adapter = ProcessDebuggerAdapter::new(config);
    let (_tx, mut rx) = mpsc::unbounded_channel();

    let err = adapter.read_until_sentinel(&mut rx, None).await.unwrap_err();
    assert!(matches!(err, DriverError::Timeout));
}

#[test]
fn default_config_reads_paths_from_env_overrides() {
    let config = ProcessDriverConfig::default();
    assert_eq!(config.quit_command, "q");
    assert!(config.idle_timeout > Duration::ZERO);
    assert!(config.ready_timeout > Duration::ZERO);
    assert!(config.dispose_grace > Duration::ZERO);
}
