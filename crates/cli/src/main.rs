// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dbgx - crash dump debugging CLI

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod output;
mod poll;

use output::OutputFormat;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{command, daemon, extension, run, session};

#[derive(Parser)]
#[command(
    name = "dbgx",
    version,
    about = "dbgx - a daemon-backed crash dump debugger"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon process management
    Daemon(daemon::DaemonArgs),
    /// Open or close a debugging session on a crash dump
    Session(session::SessionArgs),
    /// Enqueue a debugger command or read back its result
    Command(command::CommandArgs),
    /// Enqueue a registered debugger extension
    Extension(extension::ExtensionArgs),
    /// Enqueue a command and block until it finishes
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command().styles(color::styles())
}

async fn run_cli() -> Result<()> {
    let matches = cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Daemon(args) => daemon::daemon(args, format).await,
        Commands::Session(args) => session::session(args, format).await,
        Commands::Command(args) => command::command(args, format).await,
        Commands::Extension(args) => extension::extension(args, format).await,
        Commands::Run(args) => run::run(args, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
