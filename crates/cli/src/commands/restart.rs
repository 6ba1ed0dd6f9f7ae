// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart flag commands
//!
//! Setting the flag makes the current leader stop every follower once the
//! queue is drained, then exit itself. The leader deletes the flag when it
//! releases the lease.

use super::Target;
use anyhow::{Context, Result};
use clap::Args;
use sq_adapters::LeaseStore;
use std::time::Duration;

/// Value stored under the restart key; only its presence matters
const RESTART_FLAG: &str = "1";

#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Let the flag expire after this long (e.g. "10m"); default never
    #[arg(long, value_parser = humantime::parse_duration)]
    pub ttl: Option<Duration>,
}

pub async fn restart(target: &Target, args: RestartArgs) -> Result<()> {
    let key = target.group.restart_key();
    target
        .lease_store()
        .set(&key, RESTART_FLAG, args.ttl.unwrap_or(Duration::ZERO))
        .await
        .with_context(|| format!("failed to set {}", key))?;

    match args.ttl {
        Some(ttl) => println!(
            "Restart requested for {} (expires in {})",
            target.group,
            humantime::format_duration(ttl)
        ),
        None => println!("Restart requested for {}", target.group),
    }
    Ok(())
}

pub async fn cancel_restart(target: &Target) -> Result<()> {
    let key = target.group.restart_key();
    target
        .lease_store()
        .delete(&key)
        .await
        .with_context(|| format!("failed to delete {}", key))?;
    println!("Restart cancelled for {}", target.group);
    Ok(())
}
