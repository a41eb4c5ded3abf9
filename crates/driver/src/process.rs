// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real [`DebuggerAdapter`] backed by a spawned CDB/WinDbg child
//! process.
//!
//! The child is a stateful REPL: one command executes at a time, and the
//! driver frames its output by a unique prompt sentinel that the child
//! itself is configured to print after every command. Two reader tasks
//! demultiplex stdout and stderr into a single ordered channel so the
//! caller sees interleaved output without racing on two file descriptors.
//! The handle mutex is held for the full duration of a command, which
//! matches the driver's own "one command at a time" contract rather than
//! adding a second layer of serialization.

use crate::debugger::{DebuggerAdapter, DriverError};
use crate::env;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A line read from the child, tagged by which stream it came from.
#[derive(Debug, Clone)]
enum ChildLine {
    Stdout(String),
    Stderr(String),
    /// The child process has exited.
    Exited,
}

struct ChildHandle {
    child: Child,
    stdin: ChildStdin,
    lines: mpsc::UnboundedReceiver<ChildLine>,
}

/// Configuration for spawning the child debugger process.
#[derive(Debug, Clone)]
pub struct ProcessDriverConfig {
    /// Path to the debugger executable (e.g. `cdb.exe`).
    pub executable: PathBuf,
    /// Command that makes the child exit cleanly.
    pub quit_command: String,
    /// A harmless command written right after every real command, to force
    /// the child to reprint its prompt sentinel even when the real command
    /// produced no output of its own (spec.md §4.1).
    pub noop_command: String,
    /// How long the driver waits for a line of output before declaring
    /// the command timed out. Reset on every line received.
    pub idle_timeout: Duration,
    /// How long `start` waits for the first sentinel before failing.
    pub ready_timeout: Duration,
    /// Grace period `dispose` waits after the quit command before killing
    /// the process tree.
    pub dispose_grace: Duration,
}

impl Default for ProcessDriverConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("cdb"),
            quit_command: "q".to_string(),
            noop_command: ".echo".to_string(),
            idle_timeout: env::command_idle_timeout(),
            ready_timeout: env::driver_ready_timeout(),
            dispose_grace: env::dispose_grace_period(),
        }
    }
}

#[derive(Clone)]
pub struct ProcessDebuggerAdapter {
    config: ProcessDriverConfig,
    sentinel: Arc<str>,
    handle: Arc<Mutex<Option<ChildHandle>>>,
    active: Arc<AtomicBool>,
}

impl ProcessDebuggerAdapter {
    pub fn new(config: ProcessDriverConfig) -> Self {
        let sentinel = format!("<<<dbgx-{}>>>", uuid::Uuid::new_v4());
        Self {
            config,
            sentinel: Arc::from(sentinel.as_str()),
            handle: Arc::new(Mutex::new(None)),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    fn spawn_reader_tasks(
        stdout: tokio::process::ChildStdout,
        stderr: tokio::process::ChildStderr,
    ) -> mpsc::UnboundedReceiver<ChildLine> {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_out = tx.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx_out.send(ChildLine::Stdout(line)).is_err() {
                    break;
                }
            }
            let _ = tx_out.send(ChildLine::Exited);
        });

        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx.send(ChildLine::Stderr(line)).is_err() {
                    break;
                }
            }
        });

        rx
    }

    /// Read lines until one starts with the sentinel (after trimming),
    /// honoring cancellation and the idle timeout. The sentinel line
    /// itself is consumed, not returned.
    async fn read_until_sentinel(
        &self,
        lines: &mut mpsc::UnboundedReceiver<ChildLine>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<String, DriverError> {
        let mut output = String::new();
        loop {
            let next = tokio::time::timeout(self.config.idle_timeout, async {
                if let Some(token) = cancellation {
                    tokio::select! {
                        line = lines.recv() => line,
                        _ = token.cancelled() => None,
                    }
                } else {
                    lines.recv().await
                }
            })
            .await;

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if let Some(token) = cancellation {
                        if token.is_cancelled() {
                            return Err(DriverError::Cancelled);
                        }
                    }
                    return Err(DriverError::ChildCrashed(
                        "output channel closed".to_string(),
                    ));
                }
                Err(_elapsed) => return Err(DriverError::Timeout),
            };

            match line {
                ChildLine::Exited => {
                    self.active.store(false, Ordering::SeqCst);
                    return Err(DriverError::ChildCrashed(
                        "process exited unexpectedly".to_string(),
                    ));
                }
                ChildLine::Stdout(text) => {
                    if text.trim_start().starts_with(self.sentinel.as_ref()) {
                        return Ok(output);
                    }
                    output.push_str(&text);
                    output.push('\n');
                }
                ChildLine::Stderr(text) => {
                    output.push_str("[STDERR] ");
                    output.push_str(&text);
                    output.push('\n');
                }
            }
        }
    }
}

#[async_trait]
impl DebuggerAdapter for ProcessDebuggerAdapter {
    async fn start(
        &self,
        dump_path: &Path,
        symbols_path: Option<&Path>,
    ) -> Result<(), DriverError> {
        let mut command = tokio::process::Command::new(&self.config.executable);
        command
            .arg("-z")
            .arg(dump_path)
            .arg("-c")
            .arg(format!(".prompt_set {}", self.sentinel));
        if let Some(symbols) = symbols_path {
            command.arg("-y").arg(symbols);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| DriverError::StartFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::StartFailed("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::StartFailed("no stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DriverError::StartFailed("no stderr pipe".to_string()))?;

        let mut lines = Self::spawn_reader_tasks(stdout, stderr);

        let ready = tokio::time::timeout(
            self.config.ready_timeout,
            self.read_until_sentinel(&mut lines, None),
        )
        .await;

        match ready {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(DriverError::StartFailed(e.to_string())),
            Err(_) => {
                return Err(DriverError::StartFailed(
                    "timed out waiting for the prompt sentinel".to_string(),
                ))
            }
        }

        *self.handle.lock().await = Some(ChildHandle {
            child,
            stdin,
            lines,
        });
        self.active.store(true, Ordering::SeqCst);
        tracing::info!(dump = %dump_path.display(), "debugger driver ready");
        Ok(())
    }

    async fn execute(
        &self,
        command_text: &str,
        cancellation: CancellationToken,
    ) -> Result<String, DriverError> {
        let mut guard = self.handle.lock().await;
        let handle = guard
            .as_mut()
            .ok_or_else(|| DriverError::ChildCrashed("driver not started".to_string()))?;

        let write_result = async {
            handle.stdin.write_all(command_text.as_bytes()).await?;
            handle.stdin.write_u8(b'\n').await?;
            // Force the prompt (and sentinel) to reprint even if
            // `command_text` produced no output of its own.
            handle.stdin.write_all(self.config.noop_command.as_bytes()).await?;
            handle.stdin.write_u8(b'\n').await?;
            handle.stdin.flush().await
        }
        .await;

        if let Err(e) = write_result {
            self.active.store(false, Ordering::SeqCst);
            return Err(DriverError::ChildCrashed(e.to_string()));
        }

        self.read_until_sentinel(&mut handle.lines, Some(&cancellation))
            .await
    }

    async fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn dispose(&self) {
        let mut guard = self.handle.lock().await;
        let Some(handle) = guard.as_mut() else {
            return;
        };
        self.active.store(false, Ordering::SeqCst);

        let quit = format!("{}\n", self.config.quit_command);
        let _ = handle.stdin.write_all(quit.as_bytes()).await;
        let _ = handle.stdin.flush().await;

        let exited = tokio::time::timeout(self.config.dispose_grace, handle.child.wait()).await;
        if exited.is_err() {
            tracing::warn!("debugger did not exit within the grace period, killing");
            let _ = handle.child.kill().await;
        }
        *guard = None;
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
