// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help/version output specs.

use crate::prelude::*;

#[test]
fn dbgx_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn dbgx_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn dbgx_help_lists_every_subcommand() {
    let run = cli().args(&["--help"]).passes();
    for name in ["daemon", "session", "command", "extension", "run"] {
        run.stdout_has(name);
    }
}

#[test]
fn dbgx_daemon_help_shows_subcommands() {
    cli()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status")
        .stdout_has("logs");
}

#[test]
fn dbgx_session_help_shows_subcommands() {
    cli()
        .args(&["session", "--help"])
        .passes()
        .stdout_has("open")
        .stdout_has("close");
}

#[test]
fn dbgx_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
