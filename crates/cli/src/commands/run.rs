// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgx run` - enqueue a command and block until it reaches a terminal state.

use crate::client::DaemonClient;
use crate::commands::command::print_result;
use crate::output::OutputFormat;
use crate::poll::{Poller, Tick};
use anyhow::{anyhow, Result};
use clap::Args;
use dbgx_daemon::Response;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Session id returned by `session open`
    pub session_id: String,
    /// The debugger command to run
    pub command: String,
    /// How often to poll for the result
    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,
    /// Give up waiting after this many seconds (no limit by default)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

pub async fn run(args: RunArgs, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_action().map_err(|e| anyhow!("{e}"))?;

    let enqueue_response = client
        .enqueue_command(&args.session_id, &args.command)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let Response::EnqueueCommand {
        session_id,
        command_id,
        ..
    } = enqueue_response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    let mut poller = Poller::new(
        Duration::from_millis(args.poll_interval_ms),
        args.timeout_secs.map(Duration::from_secs),
    );

    loop {
        let response = client
            .read_command_result(&session_id, &command_id)
            .await
            .map_err(|e| anyhow!("{e}"))?;

        let Response::ReadCommandResult { ref status, .. } = response else {
            return Err(anyhow!("unexpected response from daemon"));
        };

        if matches!(status.as_str(), "Success" | "Failed" | "Cancelled") {
            return print_result(&response, format);
        }

        match poller.tick().await {
            Tick::Ready => continue,
            Tick::Timeout => {
                println!("timed out waiting for command {command_id} to finish");
                return print_result(&response, format);
            }
            Tick::Interrupted => {
                println!("interrupted; command {command_id} is still running on the daemon");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
