// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dbgx daemon (dbgxd)
//!
//! Background process that owns every active debugging session: it starts
//! and supervises one `cdb`/WinDbg child per session, runs each session's
//! isolated command queue, and answers the five tools of spec.md §6 over a
//! Unix domain socket. Normally started by the `dbgx` CLI's `daemon start`
//! subcommand, not invoked directly.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod listener;
mod protocol;

use std::sync::Arc;

use dbgx_core::SystemClock;
use dbgx_driver::{
    ChannelNotifyAdapter, ProcessDebuggerAdapter, ProcessDriverConfig, TracedDebugger,
};
use dbgx_engine::{SessionManager, SessionManagerConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::listener::{ListenCtx, Listener};

type Driver = TracedDebugger<ProcessDebuggerAdapter>;
type Manager = SessionManager<Driver, ChannelNotifyAdapter, SystemClock>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("dbgxd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("dbgxd {}", env!("CARGO_PKG_VERSION"));
                println!("dbgx daemon - owns crash-dump debugging sessions and their command queues");
                println!();
                println!("USAGE:");
                println!("    dbgxd");
                println!();
                println!("The daemon is typically started by the `dbgx` CLI and should not be");
                println!("invoked directly. It listens on a Unix socket for the open-session,");
                println!("close-session, enqueue-command, read-command-result, and");
                println!("enqueue-extension tools.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: dbgxd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let _log_guard = setup_logging(&config)?;

    info!("starting dbgx daemon");

    let lock_file = match acquire_lock(&config.lock_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("dbgxd is already running ({err})");
            std::process::exit(1);
        }
    };

    let _ = std::fs::remove_file(&config.socket_path);
    let unix_listener = tokio::net::UnixListener::bind(&config.socket_path)?;

    let (notify_adapter, mut notify_rx) = ChannelNotifyAdapter::new();
    let cdb_path = config.cdb_path.clone();
    let driver_factory: Arc<dyn Fn() -> Driver + Send + Sync> = Arc::new(move || {
        TracedDebugger::new(ProcessDebuggerAdapter::new(ProcessDriverConfig {
            executable: cdb_path.clone(),
            ..Default::default()
        }))
    });

    let manager: Arc<Manager> = Arc::new(SessionManager::new(
        SessionManagerConfig {
            max_sessions: config.max_sessions,
            idle_timeout: config.idle_timeout,
            cache: dbgx_engine::CacheConfig::default(),
        },
        driver_factory,
        notify_adapter,
        SystemClock,
    ));

    let ctx = Arc::new(ListenCtx {
        sessions: manager.clone(),
        extensions_enabled: config.extensions_enabled,
    });
    let listener = Listener::new(unix_listener, ctx);
    tokio::spawn(listener.run());

    tokio::spawn(async move {
        while let Some(event) = notify_rx.recv().await {
            tracing::debug!(?event, "notification delivered");
        }
    });

    spawn_idle_sweep(manager.clone());
    spawn_health_sweep(manager.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "daemon ready, listening on {}",
        config.socket_path.display()
    );
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    for id in manager.list() {
        manager.close(&id).await;
    }
    drop(lock_file);
    let _ = std::fs::remove_file(&config.socket_path);
    info!("daemon stopped");
    Ok(())
}

fn spawn_idle_sweep(manager: Arc<Manager>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(crate::env::idle_sweep_interval());
        loop {
            interval.tick().await;
            manager.sweep_idle().await;
        }
    });
}

fn spawn_health_sweep(manager: Arc<Manager>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(crate::env::health_sweep_interval());
        loop {
            interval.tick().await;
            manager.sweep_health().await;
        }
    });
}

/// Single-instance guard: an advisory exclusive lock on `config.lock_path`,
/// held for the daemon process's lifetime. The lock file doubles as a PID
/// file once the lock is held, so `dbgx daemon stop` can find us.
fn acquire_lock(lock_path: &std::path::Path) -> Result<std::fs::File, std::io::Error> {
    use fs2::FileExt;
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(lock_path)?;
    file.try_lock_exclusive()?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (dbgxd.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `dbgxd.log` → `dbgxd.log.1` → `dbgxd.log.2` → `dbgxd.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

const STARTUP_MARKER_PREFIX: &str = "--- dbgxd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), ConfigError> {
    use std::io::Write;
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(
        file,
        "{}{}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id()
    )?;
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, ConfigError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(ConfigError::NoStateDir)?,
        config.log_path.file_name().ok_or(ConfigError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
