// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static bucket queue worker daemon (sqd)
//!
//! Runs one worker of a group until it is stopped by a restart drain or a
//! signal, then releases its lease.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod shell;

use std::path::PathBuf;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, Overrides};

#[derive(Parser)]
#[command(name = "sqd", version, about = "Static bucket queue worker")]
struct Args {
    /// Worker configuration file (TOML)
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args.config, args.overrides)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let worker = daemon.worker.clone();
    let outcome = tokio::select! {
        result = worker.run() => result.map(Some),

        // Graceful shutdown on SIGTERM
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(None)
        }

        // Graceful shutdown on SIGINT
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            Ok(None)
        }
    };

    daemon.shutdown().await;

    match outcome {
        Ok(exit) => {
            info!(?exit, "Daemon stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daemon stopped on fatal error");
            drop(log_guard);
            Err(e.into())
        }
    }
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match &config.log_file {
        Some(path) => {
            // Create log directory if needed
            let dir = path
                .parent()
                .ok_or_else(|| LifecycleError::InvalidLogPath(path.clone()))?;
            let file_name = path
                .file_name()
                .ok_or_else(|| LifecycleError::InvalidLogPath(path.clone()))?;
            std::fs::create_dir_all(dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
