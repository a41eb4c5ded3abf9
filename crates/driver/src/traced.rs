// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability.

use crate::debugger::{DebuggerAdapter, DriverError};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing spans to any [`DebuggerAdapter`].
#[derive(Clone)]
pub struct TracedDebugger<D> {
    inner: D,
}

impl<D> TracedDebugger<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: DebuggerAdapter> DebuggerAdapter for TracedDebugger<D> {
    async fn start(
        &self,
        dump_path: &Path,
        symbols_path: Option<&Path>,
    ) -> Result<(), DriverError> {
        async {
            tracing::info!("starting debugger driver");
            let start = std::time::Instant::now();
            let result = self.inner.start(dump_path, symbols_path).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "driver ready"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "driver start failed"),
            }
            result
        }
        .instrument(tracing::info_span!("driver.start", dump = %dump_path.display()))
        .await
    }

    async fn execute(
        &self,
        command_text: &str,
        cancellation: CancellationToken,
    ) -> Result<String, DriverError> {
        async {
            tracing::debug!("executing command");
            let start = std::time::Instant::now();
            let result = self.inner.execute(command_text, cancellation).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(output) => {
                    tracing::debug!(elapsed_ms, output_len = output.len(), "command completed")
                }
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "command failed"),
            }
            result
        }
        .instrument(tracing::info_span!("driver.execute", command = command_text))
        .await
    }

    async fn is_active(&self) -> bool {
        self.inner.is_active().await
    }

    async fn dispose(&self) {
        tracing::info_span!("driver.dispose").in_scope(|| tracing::info!("disposing driver"));
        self.inner.dispose().await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
