// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgx extension` - enqueue a named debugger extension on a session.

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use clap::Args;
use dbgx_daemon::Response;

#[derive(Args)]
pub struct ExtensionArgs {
    /// Session id returned by `session open`
    pub session_id: String,
    /// Registered extension name
    pub extension_name: String,
    /// JSON object of parameters to pass to the extension
    #[arg(long, value_parser = parse_json)]
    pub parameters: Option<serde_json::Value>,
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

pub async fn extension(args: ExtensionArgs, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::for_action().map_err(|e| anyhow!("{e}"))?;
    let response = client
        .enqueue_extension(&args.session_id, &args.extension_name, args.parameters)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let Response::EnqueueExtension {
        session_id,
        command_id,
        extension_name,
        status,
        timeout_minutes,
    } = response
    else {
        return Err(anyhow!("unexpected response from daemon"));
    };

    match format {
        OutputFormat::Text => {
            println!("command: {command_id}");
            println!("session: {session_id}");
            println!("extension: {extension_name}");
            println!("status: {status}");
            println!("timeout: {timeout_minutes}m");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "sessionId": session_id,
                "commandId": command_id,
                "extensionName": extension_name,
                "status": status,
                "timeoutMinutes": timeout_minutes,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
