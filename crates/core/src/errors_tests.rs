// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_limit_message_matches_contract_wording() {
    let err = ErrorKind::SessionLimitExceeded { current: 2, max: 2 };
    assert_eq!(err.to_string(), "Maximum concurrent sessions exceeded: 2/2");
}

#[test]
fn dump_file_missing_message_contains_contract_phrase() {
    let err = ErrorKind::dump_file_missing("/no/such/file.dmp");
    assert!(err.to_string().contains("Dump file does not exist"));
}

#[test]
fn only_queue_not_ready_is_retryable() {
    assert!(ErrorKind::QueueNotReady.is_retryable());
    assert!(!ErrorKind::Internal("boom".into()).is_retryable());
    assert!(!ErrorKind::SessionNotFound("sess-000001-abcdef01".into()).is_retryable());
}

#[yare::parameterized(
    invalid_input = { ErrorKind::InvalidInput("bad".into()), "InvalidInput" },
    session_not_found = { ErrorKind::SessionNotFound("x".into()), "SessionNotFound" },
    command_not_found = { ErrorKind::CommandNotFound("x".into()), "CommandNotFound" },
    queue_not_ready = { ErrorKind::QueueNotReady, "QueueNotReady" },
    driver_start_failed = { ErrorKind::DriverStartFailed("x".into()), "DriverStartFailed" },
    child_crashed = { ErrorKind::ChildCrashed("x".into()), "ChildCrashed" },
    cancelled = { ErrorKind::Cancelled("x".into()), "Cancelled" },
    extension_not_found = { ErrorKind::ExtensionNotFound("x".into()), "ExtensionNotFound" },
    extension_subsystem_disabled = { ErrorKind::ExtensionSubsystemDisabled, "ExtensionSubsystemDisabled" },
    internal = { ErrorKind::Internal("x".into()), "Internal" },
)]
fn tag_matches_kind(err: ErrorKind, expected: &str) {
    assert_eq!(err.tag(), expected);
}
