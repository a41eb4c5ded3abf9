// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs: start/stop/restart/status against a real,
//! separately-spawned `dbgxd` process.

use crate::prelude::*;

#[test]
fn daemon_status_reports_not_running_before_start() {
    let project = Project::empty();
    project
        .dbgx()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn daemon_start_then_status_reports_running() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .dbgx()
            .args(&["daemon", "status"])
            .passes()
            .stdout()
            .contains("running")
    });
    assert!(running, "daemon log:\n{}", project.daemon_log());

    project
        .dbgx()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("pid");
}

#[test]
fn daemon_start_is_idempotent() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();
    project.dbgx().args(&["daemon", "start"]).passes();
}

#[test]
fn daemon_stop_reports_success_then_not_running() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .dbgx()
            .args(&["daemon", "status"])
            .passes()
            .stdout()
            .contains("running")
    });
    assert!(running);

    project
        .dbgx()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("stopped");

    project
        .dbgx()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn daemon_stop_when_not_running_reports_not_running() {
    let project = Project::empty();
    project
        .dbgx()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn daemon_restart_brings_up_a_new_instance() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .dbgx()
            .args(&["daemon", "status"])
            .passes()
            .stdout()
            .contains("running")
    });
    assert!(running);

    project
        .dbgx()
        .args(&["daemon", "restart"])
        .passes()
        .stdout_has("restarted");

    let running_again = wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .dbgx()
            .args(&["daemon", "status"])
            .passes()
            .stdout()
            .contains("running")
    });
    assert!(running_again, "daemon log:\n{}", project.daemon_log());
}

#[test]
fn daemon_start_creates_socket_and_lock_files() {
    let project = Project::empty();
    project.dbgx().args(&["daemon", "start"]).passes();

    let socket_exists = wait_for(SPEC_WAIT_MAX_MS, || {
        project.state_path().join("dbgxd.sock").exists()
    });
    assert!(socket_exists, "daemon log:\n{}", project.daemon_log());
    assert!(project.state_path().join("dbgxd.lock").exists());
}
