// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between `dbgx-cli` and `dbgxd`: the five tools of
//! spec.md §6, framed as 4-byte-big-endian-length-prefixed JSON messages
//! over the daemon's Unix domain socket.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Bumped whenever `Request`/`Response` change shape in a way that breaks
/// wire compatibility between an old `dbgx` and a new `dbgxd` or vice versa.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single framed message, guarding against a corrupt or
/// malicious length prefix forcing an unbounded allocation.
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// How long a read/write of one frame may take before the connection is
/// dropped.
pub const IO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_SIZE} byte limit")]
    MessageTooLarge(u32),
    #[error("timed out waiting for the daemon")]
    Timeout,
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum Request {
    OpenSession {
        dump_path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        symbols_path: Option<PathBuf>,
    },
    CloseSession {
        session_id: String,
    },
    EnqueueCommand {
        session_id: String,
        command: String,
    },
    ReadCommandResult {
        session_id: String,
        command_id: String,
    },
    EnqueueExtension {
        session_id: String,
        extension_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameters: Option<serde_json::Value>,
    },
}

/// `progress{queuePosition, progressPercentage, elapsed, eta, executionTime, checkAgain}`
/// from the `read-command-result` contract (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub queue_position: u32,
    pub progress_percentage: u8,
    pub elapsed: String,
    pub eta: String,
    pub execution_time: String,
    pub check_again: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum Response {
    OpenSession {
        session_id: String,
        dump_file: String,
        status: String,
        message: String,
    },
    CloseSession {
        session_id: String,
        status: String,
        message: String,
    },
    EnqueueCommand {
        session_id: String,
        command_id: String,
        status: String,
        queue_position: u32,
        total_in_queue: usize,
        timeout_minutes: u64,
    },
    ReadCommandResult {
        session_id: String,
        command_id: String,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        completed_at: Option<u64>,
        progress: Progress,
        status_explanation: String,
    },
    EnqueueExtension {
        session_id: String,
        command_id: String,
        extension_name: String,
        status: String,
        timeout_minutes: u64,
    },
    Error {
        kind: String,
        message: String,
    },
}

/// Reads one length-prefixed JSON frame, bounding both the wait and the
/// frame size.
pub async fn read_message<T, R>(reader: &mut R) -> Result<T, ProtocolError>
where
    T: for<'de> Deserialize<'de>,
    R: tokio::io::AsyncRead + Unpin,
{
    let len = tokio::time::timeout(IO_TIMEOUT, async {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await?;
        Ok::<_, std::io::Error>(u32::from_be_bytes(buf))
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut body = vec![0u8; len as usize];
    tokio::time::timeout(IO_TIMEOUT, reader.read_exact(&mut body))
        .await
        .map_err(|_| ProtocolError::Timeout)??;

    Ok(serde_json::from_slice(&body)?)
}

/// Writes one length-prefixed JSON frame.
pub async fn write_message<T, W>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: tokio::io::AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value)?;
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::MessageTooLarge(u32::MAX))?;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    tokio::time::timeout(IO_TIMEOUT, async {
        writer.write_all(&len.to_be_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;

    Ok(())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
