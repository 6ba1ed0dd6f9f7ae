// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group status

use super::Target;
use anyhow::{Context, Result};
use serde::Serialize;
use sq_adapters::{LeaseStore, PeerChannel, TcpPeerChannel};
use sq_core::WorkerUri;
use std::fmt;

#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub group: String,
    pub leader: Option<WorkerUri>,
    /// None when there is no leader to probe
    pub leader_alive: Option<bool>,
    pub restart_requested: bool,
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "group:    {}", self.group)?;
        match (&self.leader, self.leader_alive) {
            (Some(leader), Some(true)) => writeln!(f, "leader:   {}", leader)?,
            (Some(leader), _) => writeln!(f, "leader:   {} (unreachable)", leader)?,
            (None, _) => writeln!(f, "leader:   none")?,
        }
        write!(
            f,
            "restart:  {}",
            if self.restart_requested {
                "requested"
            } else {
                "no"
            }
        )
    }
}

pub async fn status(target: &Target) -> Result<StatusInfo> {
    let store = target.lease_store();
    let token_key = target.group.token_key();
    let restart_key = target.group.restart_key();

    let leader = store
        .get(&token_key)
        .await
        .with_context(|| format!("failed to read {}", token_key))?
        .map(WorkerUri::new);
    let restart_requested = store
        .get(&restart_key)
        .await
        .with_context(|| format!("failed to read {}", restart_key))?
        .is_some();

    let leader_alive = match &leader {
        Some(uri) => Some(matches!(
            TcpPeerChannel::new().probe_alive(uri).await,
            Ok(true)
        )),
        None => None,
    };

    Ok(StatusInfo {
        group: target.group.name().to_string(),
        leader,
        leader_alive,
        restart_requested,
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
