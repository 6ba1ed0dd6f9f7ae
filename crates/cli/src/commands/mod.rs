// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod check;
pub mod restart;
pub mod status;

use anyhow::{Context, Result};
use clap::Args;
use sq_adapters::MemcacheLeaseStore;
use sq_core::{Group, WorkerConfig, DEFAULT_LEASE_SERVER};
use std::path::PathBuf;

/// Which group to act on and where its lease lives
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Take group and servers from a worker config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Coordination group (overrides the config file)
    #[arg(short, long, global = true, env = "SQ_GROUP")]
    pub group: Option<String>,
    /// Lease store endpoint, repeatable (overrides the config file)
    #[arg(long = "server", global = true)]
    pub servers: Vec<String>,
}

/// Resolved command target
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub group: Group,
    pub servers: Vec<String>,
}

impl TargetArgs {
    pub fn resolve(&self) -> Result<Target> {
        let from_file = match &self.config {
            Some(path) => Some(WorkerConfig::load(path).with_context(|| {
                format!("cannot use {} as the command target", path.display())
            })?),
            None => None,
        };

        let group = match (&self.group, &from_file) {
            (Some(group), _) => Group::new(group.as_str()),
            (None, Some(config)) => config.group.clone(),
            (None, None) => anyhow::bail!("no group given: pass --group or --config"),
        };
        let servers = if !self.servers.is_empty() {
            self.servers.clone()
        } else if let Some(config) = from_file {
            config.servers
        } else {
            vec![DEFAULT_LEASE_SERVER.to_string()]
        };
        Ok(Target { group, servers })
    }
}

impl Target {
    pub fn lease_store(&self) -> MemcacheLeaseStore {
        MemcacheLeaseStore::new(&self.servers)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
