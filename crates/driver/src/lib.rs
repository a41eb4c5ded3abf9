// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! dbgx-driver: the debugger I/O driver (C1) and notification bus (C8)
//! adapters.

pub mod debugger;
mod env;
pub mod notify;
pub mod process;
pub mod traced;

pub use debugger::{DebuggerAdapter, DriverError};
pub use notify::{ChannelNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError, NotifyEvent};
pub use process::{ProcessDebuggerAdapter, ProcessDriverConfig};
pub use traced::TracedDebugger;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDebuggerAdapter, RecordedCall, ScriptedResponse};
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifyAdapter;
