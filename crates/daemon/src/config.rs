// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state directory, socket/log paths, and the engine
//! tunables the listener hands to [`dbgx_engine::SessionManagerConfig`].
//!
//! Resolution order (later wins): built-in defaults, an optional TOML file
//! at `<state_dir>/config.toml`, then environment variable overrides
//! (SPEC_FULL.md §3).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory; set DBGX_STATE_DIR")]
    NoStateDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    cdb_path: Option<PathBuf>,
    max_sessions: Option<usize>,
    idle_timeout_secs: Option<u64>,
    extensions_enabled: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub log_path: PathBuf,
    pub lock_path: PathBuf,
    pub cdb_path: PathBuf,
    pub max_sessions: usize,
    pub idle_timeout: Duration,
    /// Whether `enqueue-extension` serves real jobs. When `false`, the
    /// listener fails every `enqueue-extension` call with
    /// `ErrorKind::ExtensionSubsystemDisabled` (spec.md §6).
    pub extensions_enabled: bool,
}

const DEFAULT_MAX_SESSIONS: usize = 10;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_EXTENSIONS_ENABLED: bool = true;

impl Config {
    /// Resolves the state directory via `DBGX_STATE_DIR`, falling back to
    /// `dirs::state_dir()/dbgx` (XDG on Linux), merges an optional
    /// `config.toml` in that directory, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = crate::env::state_dir_override()
            .or_else(|| dirs::state_dir().map(|d| d.join("dbgx")))
            .ok_or(ConfigError::NoStateDir)?;
        std::fs::create_dir_all(&state_dir)?;

        let toml_path = state_dir.join("config.toml");
        let file_config = if toml_path.exists() {
            let text = std::fs::read_to_string(&toml_path).map_err(|source| ConfigError::Read {
                path: toml_path.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: toml_path,
                source,
            })?
        } else {
            FileConfig::default()
        };

        let cdb_path = crate::env::cdb_path_override()
            .or(file_config.cdb_path)
            .unwrap_or_else(|| PathBuf::from("cdb"));
        let max_sessions = crate::env::max_sessions_override()
            .or(file_config.max_sessions)
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        let idle_timeout = crate::env::idle_timeout_override()
            .or_else(|| file_config.idle_timeout_secs.map(Duration::from_secs))
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS));
        let extensions_enabled = crate::env::extensions_enabled_override()
            .or(file_config.extensions_enabled)
            .unwrap_or(DEFAULT_EXTENSIONS_ENABLED);

        Ok(Self {
            socket_path: state_dir.join("dbgxd.sock"),
            log_path: state_dir.join("dbgxd.log"),
            lock_path: state_dir.join("dbgxd.lock"),
            state_dir,
            cdb_path,
            max_sessions,
            idle_timeout,
            extensions_enabled,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
