// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extension jobs: the opaque long-running script runner tracked alongside
//! ordinary commands.
//!
//! Extension jobs share the command state machine ([`crate::command::CommandState`])
//! and are ultimately stored back into the same result cache, but carry their
//! own id namespace (`ext-<uuid-v4>`) and a 30-minute default timeout instead
//! of the execution-class table.

use crate::command::CommandState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Default timeout for every extension job, regardless of name.
pub const EXTENSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionJobId(String);

impl ExtensionJobId {
    pub fn new() -> Self {
        Self(format!("ext-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("ext-")?;
        Uuid::parse_str(rest).ok()?;
        Some(Self(s.to_string()))
    }
}

impl Default for ExtensionJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExtensionJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for ExtensionJobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A long-running extension script job, tracked in parallel with ordinary
/// commands. The core treats `parameters` and the eventual result as opaque
/// blobs; it never inspects their contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionJob {
    pub id: ExtensionJobId,
    pub extension_name: String,
    pub parameters: Option<serde_json::Value>,
    pub state: CommandState,
    /// Latest free-text progress message published by the extension runner.
    pub progress_message: Option<String>,
    pub callback_count: u32,
    #[serde(with = "crate::result::duration_ms")]
    pub elapsed: Duration,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ExtensionJob {
    pub fn new(extension_name: impl Into<String>, parameters: Option<serde_json::Value>) -> Self {
        Self {
            id: ExtensionJobId::new(),
            extension_name: extension_name.into(),
            parameters,
            state: CommandState::Queued,
            progress_message: None,
            callback_count: 0,
            elapsed: Duration::ZERO,
            result: None,
            error: None,
        }
    }

    pub fn record_callback(&mut self, message: impl Into<String>) {
        self.progress_message = Some(message.into());
        self.callback_count += 1;
    }
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
