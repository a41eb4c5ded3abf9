// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session open/close specs. The test environment has no real `cdb`/WinDbg
//! installed, so every `session open` fails at the driver-start step - these
//! specs exercise the daemon round trip and graceful error reporting rather
//! than a live debugging session.

use crate::prelude::*;

#[test]
fn opening_a_session_without_a_debugger_reports_failed_status() {
    let project = Project::empty();
    let dump_path = project.file("crash.dmp", "not a real dump");

    project
        .dbgx()
        .args(&["session", "open", dump_path.to_str().unwrap()])
        .passes()
        .stdout_has("status: Failed");
}

#[test]
fn closing_an_unknown_session_reports_failed_status() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    project
        .dbgx()
        .args(&["session", "close", "no-such-session"])
        .passes()
        .stdout_has("status: Failed");
}

#[test]
fn closing_a_malformed_session_id_reports_failed_status() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    project
        .dbgx()
        .args(&["session", "close", "!!!not-a-valid-id!!!"])
        .passes()
        .stdout_has("status: Failed");
}

#[test]
fn reading_a_command_result_for_an_unknown_session_fails() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    project
        .dbgx()
        .args(&["command", "result", "no-such-session", "cmd-1"])
        .fails();
}

#[test]
fn opening_a_session_in_json_format_reports_failed_status() {
    let project = Project::empty();
    let dump_path = project.file("crash.dmp", "not a real dump");

    let stdout = project
        .dbgx()
        .args(&[
            "-o",
            "json",
            "session",
            "open",
            dump_path.to_str().unwrap(),
        ])
        .passes()
        .stdout();

    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(value["status"], "Failed");
    assert_eq!(value["dumpFile"], dump_path.to_string_lossy().as_ref());
}
