// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, wrap_with_startup_error,
};

use dbgx_daemon::protocol::{self, ProtocolError};
use dbgx_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for a single IPC round trip (enqueue/read/open/close).
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("DBGX_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a freshly-spawned daemon to start accepting connections.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("DBGX_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a stopped daemon process to exit.
pub fn timeout_exit() -> Duration {
    parse_duration_ms("DBGX_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries.
pub fn poll_interval() -> Duration {
    parse_duration_ms("DBGX_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("daemon rejected the request: {0}")]
    Rejected(String),

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine the daemon's state directory")]
    NoStateDir,
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For commands that mutate daemon state: auto-starts the daemon if it
    /// isn't already running.
    pub fn for_action() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// For commands that only read state: connects to an existing daemon,
    /// never starts one. If nothing is listening, there is nothing to read.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    /// Connect to an existing daemon (no auto-start).
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error() {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {status}"
                    )));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, request))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response: Response =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        Ok(response)
    }

    /// Send a request and receive a response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self
            .send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    fn reject(response: Response) -> Result<Response, ClientError> {
        match response {
            Response::Error { kind, message } => {
                Err(ClientError::Rejected(format!("{kind}: {message}")))
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn open_session(
        &self,
        dump_path: PathBuf,
        symbols_path: Option<PathBuf>,
    ) -> Result<Response, ClientError> {
        let request = Request::OpenSession {
            dump_path,
            symbols_path,
        };
        match self.send(&request).await? {
            response @ Response::OpenSession { .. } => Ok(response),
            other => Self::reject(other),
        }
    }

    pub async fn close_session(&self, session_id: &str) -> Result<Response, ClientError> {
        let request = Request::CloseSession {
            session_id: session_id.to_string(),
        };
        match self.send(&request).await? {
            response @ Response::CloseSession { .. } => Ok(response),
            other => Self::reject(other),
        }
    }

    pub async fn enqueue_command(
        &self,
        session_id: &str,
        command: &str,
    ) -> Result<Response, ClientError> {
        let request = Request::EnqueueCommand {
            session_id: session_id.to_string(),
            command: command.to_string(),
        };
        match self.send(&request).await? {
            response @ Response::EnqueueCommand { .. } => Ok(response),
            other => Self::reject(other),
        }
    }

    pub async fn read_command_result(
        &self,
        session_id: &str,
        command_id: &str,
    ) -> Result<Response, ClientError> {
        let request = Request::ReadCommandResult {
            session_id: session_id.to_string(),
            command_id: command_id.to_string(),
        };
        match self.send(&request).await? {
            response @ Response::ReadCommandResult { .. } => Ok(response),
            other => Self::reject(other),
        }
    }

    pub async fn enqueue_extension(
        &self,
        session_id: &str,
        extension_name: &str,
        parameters: Option<serde_json::Value>,
    ) -> Result<Response, ClientError> {
        let request = Request::EnqueueExtension {
            session_id: session_id.to_string(),
            extension_name: extension_name.to_string(),
            parameters,
        };
        match self.send(&request).await? {
            response @ Response::EnqueueExtension { .. } => Ok(response),
            other => Self::reject(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
