// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity and coordination group naming

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Peer-reachable address of a worker (`host:port`)
///
/// Doubles as the lease value when the worker holds leadership and as the
/// requester identity in every bucket request. Two workers are the same worker
/// exactly when their uris are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerUri(String);

impl WorkerUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Build the advertised uri for a bound endpoint
    ///
    /// `hostname` replaces the bound ip when the worker listens on a wildcard
    /// address but must be reached through a routable name.
    pub fn advertised(addr: SocketAddr, hostname: Option<&str>) -> Self {
        match hostname {
            Some(host) if host.contains(':') && !host.starts_with('[') => {
                Self(format!("[{}]:{}", host, addr.port()))
            }
            Some(host) => Self(format!("{}:{}", host, addr.port())),
            None => Self(addr.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkerUri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<SocketAddr> for WorkerUri {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

/// Name of a coordination domain
///
/// All workers of a group compete for the same lease and share one bucket space.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Lease store key naming the current leader
    pub fn token_key(&self) -> String {
        format!("{}_token", self.0)
    }

    /// Lease store key an operator sets to request a fleet-wide restart
    pub fn restart_key(&self) -> String {
        format!("{}_restart", self.0)
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
