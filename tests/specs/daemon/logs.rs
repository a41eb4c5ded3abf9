// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log viewing specs.

use crate::prelude::*;

#[test]
fn logs_before_daemon_ever_started_reports_no_log_file() {
    let project = Project::empty();
    project
        .dbgx()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("no log file");
}

#[test]
fn logs_after_start_contains_startup_marker() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    let has_marker = wait_for(SPEC_WAIT_MAX_MS, || {
        project.daemon_log().contains("starting")
    });
    assert!(has_marker, "daemon log:\n{}", project.daemon_log());

    project
        .dbgx()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("starting");
}

#[test]
fn logs_respects_line_limit() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    wait_for(SPEC_WAIT_MAX_MS, || {
        project.daemon_log().lines().count() > 0
    });

    project
        .dbgx()
        .args(&["daemon", "logs", "-n", "1"])
        .passes();
}
