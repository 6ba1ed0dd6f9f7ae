// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sq - static bucket queue operator CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, restart, status, TargetArgs};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sq",
    version,
    about = "Static bucket queue - operate worker groups"
)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the group to drain and stop all workers
    Restart(restart::RestartArgs),
    /// Withdraw a pending restart request
    CancelRestart,
    /// Show the leader and restart flag of a group
    Status,
    /// Validate a worker config file
    Check {
        /// Path to the config file
        #[arg(value_name = "CONFIG")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Checking a file needs no lease store
    if let Commands::Check { file } = &cli.command {
        return check::check(file);
    }

    let target = cli.target.resolve()?;
    match cli.command {
        Commands::Restart(args) => restart::restart(&target, args).await?,
        Commands::CancelRestart => restart::cancel_restart(&target).await?,
        Commands::Status => {
            let info = status::status(&target).await?;
            output::print(&info, cli.output);
        }
        Commands::Check { .. } => {}
    }
    Ok(())
}
