// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable result of a completed command.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Result of a command that has reached a terminal state.
///
/// Immutable once stored in the result cache: a later command against the
/// same id always gets a brand-new `CommandResult`, never a mutation of
/// this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    /// Captured debugger output. Empty string on failure.
    pub output: String,
    pub error: Option<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl CommandResult {
    pub fn success(output: String, duration: Duration) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration,
            metadata: HashMap::new(),
        }
    }

    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            duration,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Rough size estimate in bytes, used by the result cache for its
    /// byte budget. Deliberately approximate (UTF-8 byte length of the
    /// text fields plus a small fixed overhead); exactness is not required
    /// by the cache's eviction guarantee.
    pub fn size_estimate(&self) -> usize {
        let mut size = self.output.len() + 64;
        if let Some(err) = &self.error {
            size += err.len();
        }
        for (k, v) in &self.metadata {
            size += k.len() + v.len();
        }
        size
    }
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
