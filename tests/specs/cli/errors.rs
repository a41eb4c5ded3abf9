// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing error specs. None of these touch the daemon: clap
//! rejects the invocation before any socket is ever opened.

use crate::prelude::*;

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["bogus"]).fails().stderr_has("error:");
}

#[test]
fn session_open_without_dump_path_fails() {
    cli()
        .args(&["session", "open"])
        .fails()
        .stderr_has("required");
}

#[test]
fn session_close_without_session_id_fails() {
    cli()
        .args(&["session", "close"])
        .fails()
        .stderr_has("required");
}

#[test]
fn command_enqueue_without_command_text_fails() {
    cli()
        .args(&["command", "enqueue", "some-session"])
        .fails()
        .stderr_has("required");
}

#[test]
fn extension_with_invalid_json_parameters_fails() {
    cli()
        .args(&[
            "extension",
            "some-session",
            "analyze-heap",
            "--parameters",
            "{not json",
        ])
        .fails();
}
