// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake debugger driver for deterministic engine/queue tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::debugger::{DebuggerAdapter, DriverError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A scripted behavior for one call to [`FakeDebuggerAdapter::execute`].
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Output(String),
    Crash(String),
    /// Never completes until the cancellation token fires.
    HangUntilCancelled,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub dump_path: Option<PathBuf>,
    pub command_text: Option<String>,
}

struct FakeState {
    start_calls: Vec<RecordedCall>,
    execute_calls: Vec<RecordedCall>,
    script: VecDeque<ScriptedResponse>,
    dispose_count: u32,
    fail_start: Option<String>,
    fail_start_permanently: Option<String>,
}

/// Fake [`DebuggerAdapter`] that plays back a scripted sequence of
/// responses instead of spawning a real child process.
#[derive(Clone)]
pub struct FakeDebuggerAdapter {
    state: Arc<Mutex<FakeState>>,
    active: Arc<AtomicBool>,
}

impl Default for FakeDebuggerAdapter {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                start_calls: Vec::new(),
                execute_calls: Vec::new(),
                script: VecDeque::new(),
                dispose_count: 0,
                fail_start: None,
                fail_start_permanently: None,
            })),
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FakeDebuggerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `execute` call, in order.
    pub fn push_response(&self, response: ScriptedResponse) {
        self.state.lock().script.push_back(response);
    }

    /// Make the next `start` call fail with `DriverStartFailed`.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        self.state.lock().fail_start = Some(message.into());
    }

    /// Make every future `start` call fail with `DriverStartFailed`, e.g.
    /// to simulate a driver that never comes back up during recovery.
    pub fn fail_all_starts(&self, message: impl Into<String>) {
        self.state.lock().fail_start_permanently = Some(message.into());
    }

    pub fn start_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().start_calls.clone()
    }

    pub fn execute_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().execute_calls.clone()
    }

    pub fn dispose_count(&self) -> u32 {
        self.state.lock().dispose_count
    }
}

#[async_trait]
impl DebuggerAdapter for FakeDebuggerAdapter {
    async fn start(
        &self,
        dump_path: &Path,
        _symbols_path: Option<&Path>,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.start_calls.push(RecordedCall {
            dump_path: Some(dump_path.to_path_buf()),
            command_text: None,
        });
        if let Some(message) = state.fail_start_permanently.clone() {
            return Err(DriverError::StartFailed(message));
        }
        if let Some(message) = state.fail_start.take() {
            return Err(DriverError::StartFailed(message));
        }
        drop(state);
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(
        &self,
        command_text: &str,
        cancellation: CancellationToken,
    ) -> Result<String, DriverError> {
        self.state.lock().execute_calls.push(RecordedCall {
            dump_path: None,
            command_text: Some(command_text.to_string()),
        });
        let next = self.state.lock().script.pop_front();
        match next {
            Some(ScriptedResponse::Output(text)) => Ok(text),
            Some(ScriptedResponse::Crash(message)) => {
                self.active.store(false, Ordering::SeqCst);
                Err(DriverError::ChildCrashed(message))
            }
            Some(ScriptedResponse::HangUntilCancelled) => {
                cancellation.cancelled().await;
                Err(DriverError::Cancelled)
            }
            None => Ok(String::new()),
        }
    }

    async fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn dispose(&self) {
        self.state.lock().dispose_count += 1;
        self.active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
