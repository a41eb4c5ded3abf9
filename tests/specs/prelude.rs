// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for black-box CLI/daemon specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts so the suite stays fast. The daemon under test never
// talks to a real debugger, so every round trip should be near-instant.
const DBGX_TIMEOUT_CONNECT_MS: &str = "2000";
const DBGX_TIMEOUT_EXIT_MS: &str = "1000";
const DBGX_TIMEOUT_IPC_MS: &str = "1000";
const DBGX_CONNECT_POLL_MS: &str = "5";

pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2000;

/// Returns the path to a binary, checking the llvm-cov target directory
/// first, then falling back to resolving relative to the test binary
/// itself when `CARGO_MANIFEST_DIR` is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn dbgx_binary() -> PathBuf {
    binary_path("dbgx")
}

pub fn dbgxd_binary() -> PathBuf {
    binary_path("dbgxd")
}

pub fn dbgx_cmd() -> Command {
    Command::new(dbgx_binary())
}

/// Create a CLI builder for `dbgx` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![
                (
                    "DBGX_DAEMON_BINARY".into(),
                    dbgxd_binary().to_string_lossy().into(),
                ),
                (
                    "DBGX_TIMEOUT_CONNECT_MS".into(),
                    DBGX_TIMEOUT_CONNECT_MS.into(),
                ),
                ("DBGX_TIMEOUT_EXIT_MS".into(), DBGX_TIMEOUT_EXIT_MS.into()),
                ("DBGX_TIMEOUT_IPC_MS".into(), DBGX_TIMEOUT_IPC_MS.into()),
                ("DBGX_CONNECT_POLL_MS".into(), DBGX_CONNECT_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = dbgx_cmd();
        cmd.args(&self.args);

        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }

        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            !stderr.contains(unexpected),
            "stderr should not contain '{}'\nstderr: {}",
            unexpected,
            stderr
        );
        self
    }
}

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// Temporary test project: an isolated state directory, standing in for a
/// real crash-dump workspace.
pub struct Project {
    state_dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            state_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write a file under the project's state directory (used for crash
    /// dump / symbol fixtures so paths stay scoped to the test).
    pub fn file(&self, path: impl AsRef<Path>, content: &str) -> PathBuf {
        let full_path = self.state_dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Run `dbgx` scoped to this project's isolated state directory.
    pub fn dbgx(&self) -> CliBuilder {
        cli().env("DBGX_STATE_DIR", self.state_path())
    }

    pub fn daemon_log(&self) -> String {
        let log_path = self.state_path().join("dbgxd.log");
        std::fs::read_to_string(&log_path).unwrap_or_else(|_| "(no daemon log)".to_string())
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let mut cmd = self.dbgx().args(&["daemon", "stop"]).command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}
