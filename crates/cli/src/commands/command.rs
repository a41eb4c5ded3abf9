// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgx command` - enqueue debugger commands and read back their results.

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use dbgx_daemon::Response;

#[derive(Args)]
pub struct CommandArgs {
    #[command(subcommand)]
    pub command: CommandCommand,
}

#[derive(Subcommand)]
pub enum CommandCommand {
    /// Enqueue a debugger command (e.g. `bt`, `info registers`) on a session
    Enqueue {
        /// Session id returned by `session open`
        session_id: String,
        /// The debugger command to run
        command: String,
    },
    /// Read back the result of a previously enqueued command
    Result {
        /// Session id the command was enqueued on
        session_id: String,
        /// Command id returned by `command enqueue`
        command_id: String,
    },
}

pub async fn command(args: CommandArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        CommandCommand::Enqueue {
            session_id,
            command,
        } => enqueue(&session_id, &command, format).await,
        CommandCommand::Result {
            session_id,
            command_id,
        } => result(&session_id, &command_id, format).await,
    }
}

async fn enqueue(session_id: &str, command: &str, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_action().map_err(|e| anyhow!("{e}"))?;
    let response = client
        .enqueue_command(session_id, command)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let Response::EnqueueCommand {
        session_id,
        command_id,
        status,
        queue_position,
        total_in_queue,
        timeout_minutes,
    } = response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    match format {
        OutputFormat::Text => {
            println!("command: {command_id}");
            println!("session: {session_id}");
            println!("status: {status}");
            println!("queue position: {queue_position} of {total_in_queue}");
            println!("timeout: {timeout_minutes}m");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "sessionId": session_id,
                "commandId": command_id,
                "status": status,
                "queuePosition": queue_position,
                "totalInQueue": total_in_queue,
                "timeoutMinutes": timeout_minutes,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}

async fn result(session_id: &str, command_id: &str, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_query().map_err(|e| anyhow!("{e}"))?;
    let response = client
        .read_command_result(session_id, command_id)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    print_result(&response, format)
}

pub(crate) fn print_result(response: &Response, format: OutputFormat) -> Result<()> {
    let Response::ReadCommandResult {
        session_id,
        command_id,
        status,
        result,
        error,
        completed_at,
        progress,
        status_explanation,
    } = response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    match format {
        OutputFormat::Text => {
            println!("command: {command_id}");
            println!("session: {session_id}");
            println!("status: {status} ({status_explanation})");
            if let Some(result) = result {
                println!("--- result ---");
                println!("{result}");
            }
            if let Some(error) = error {
                println!("--- error ---");
                println!("{error}");
            }
            if let Some(completed_at) = completed_at {
                println!("completed at: {completed_at}");
            }
            if completed_at.is_none() {
                println!(
                    "progress: {}% (queue position {}, elapsed {}, eta {}, check again in {})",
                    progress.progress_percentage,
                    progress.queue_position,
                    progress.elapsed,
                    progress.eta,
                    progress.check_again
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
