// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgx session` - open and close crash-dump debugging sessions.

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use dbgx_daemon::Response;
use std::path::PathBuf;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Open a debugging session on a crash dump
    Open {
        /// Path to the crash dump file
        dump_path: PathBuf,
        /// Path to a symbols file or directory
        #[arg(long)]
        symbols: Option<PathBuf>,
    },
    /// Close a debugging session
    Close {
        /// Session id returned by `session open`
        session_id: String,
    },
}

pub async fn session(args: SessionArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        SessionCommand::Open { dump_path, symbols } => open(dump_path, symbols, format).await,
        SessionCommand::Close { session_id } => close(&session_id, format).await,
    }
}

async fn open(dump_path: PathBuf, symbols: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_action().map_err(|e| anyhow!("{e}"))?;
    let response = client
        .open_session(dump_path, symbols)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let Response::OpenSession {
        session_id,
        dump_file,
        status,
        message,
    } = response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    match format {
        OutputFormat::Text => {
            println!("session: {session_id}");
            println!("dump: {dump_file}");
            println!("status: {status}");
            println!("{message}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "sessionId": session_id,
                "dumpFile": dump_file,
                "status": status,
                "message": message,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}

async fn close(session_id: &str, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_action().map_err(|e| anyhow!("{e}"))?;
    let response = client
        .close_session(session_id)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let Response::CloseSession {
        session_id,
        status,
        message,
    } = response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    match format {
        OutputFormat::Text => {
            println!("session: {session_id}");
            println!("status: {status}");
            println!("{message}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "sessionId": session_id,
                "status": status,
                "message": message,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
