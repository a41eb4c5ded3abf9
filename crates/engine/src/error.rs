// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error type, layered over [`dbgx_core::ErrorKind`].

use dbgx_core::ErrorKind;
use thiserror::Error;

/// Errors surfaced by the engine crate's components.
///
/// This wraps [`ErrorKind`] rather than re-declaring its variants: the
/// engine never invents new error *kinds*, the tool-contract error tags
/// are a closed set shared with `dbgx-core`.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct EngineError {
    pub kind: ErrorKind,
}

impl EngineError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl From<ErrorKind> for EngineError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
