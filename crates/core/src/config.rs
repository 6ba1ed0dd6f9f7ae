// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registration configuration
//!
//! Loaded from TOML. Durations use humantime notation (`"10s"`, `"1m 30s"`).
//!
//! ```toml
//! group = "analyzer"
//! bucket_count = 16
//! iteration_length = "10s"
//! servers = ["10.0.0.2:11211"]
//! peers = ["10.0.0.5:4100", "10.0.0.6:4100"]
//! ```

use crate::identity::{Group, WorkerUri};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Iteration length used when the configuration does not name one
pub const DEFAULT_ITERATION_LENGTH: Duration = Duration::from_secs(10);

/// Lease store endpoint used when the configuration does not name any
pub const DEFAULT_LEASE_SERVER: &str = "127.0.0.1:11211";

/// Longest lease a worker will hold: memcached's relative expiry limit
pub const MAX_LEASE_LENGTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default dictatorship window, as a multiple of the iteration length
const DICTATORSHIP_FACTOR: u32 = 10;

/// Memcached rejects keys longer than this
const MAX_KEY_LEN: usize = 250;

/// Errors from loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("group name must not be empty")]
    EmptyGroup,
    #[error("group name {0:?} must not contain whitespace or control characters")]
    InvalidGroup(String),
    #[error("group name {0:?} is too long for lease store keys")]
    GroupTooLong(String),
    #[error("bucket_count must be positive")]
    NoBuckets,
    #[error("iteration_length must be positive")]
    ZeroIteration,
    #[error("dictatorship_length ({dictatorship:?}) is shorter than iteration_length ({iteration:?})")]
    DictatorshipTooShort {
        dictatorship: Duration,
        iteration: Duration,
    },
    #[error("{field} ({length:?}) exceeds the longest lease of {max:?}", max = MAX_LEASE_LENGTH)]
    LeaseTooLong { field: &'static str, length: Duration },
    #[error("at least one lease store server is required")]
    NoServers,
}

/// Registration options for one worker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Coordination domain this worker joins
    pub group: Group,
    /// Size of the bucket space, fixed for the group's lifetime
    pub bucket_count: u32,
    /// Length of one leadership term
    #[serde(default = "default_iteration_length", with = "humantime_serde")]
    pub iteration_length: Duration,
    /// Lease extension around multi-step leader operations
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub dictatorship_length: Option<Duration>,
    /// Lease store endpoints (`host:port`)
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,
    /// Statically known peers, consulted when a restart drain starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<WorkerUri>,
    /// Name under which this worker advertises its endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Port of the worker endpoint; 0 binds an ephemeral port
    #[serde(default)]
    pub port: u16,
    /// Opaque value forwarded with every bucket request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

fn default_iteration_length() -> Duration {
    DEFAULT_ITERATION_LENGTH
}

fn default_servers() -> Vec<String> {
    vec![DEFAULT_LEASE_SERVER.to_string()]
}

impl WorkerConfig {
    pub fn new(group: impl Into<String>, bucket_count: u32) -> Self {
        Self {
            group: Group::new(group),
            bucket_count,
            iteration_length: DEFAULT_ITERATION_LENGTH,
            dictatorship_length: None,
            servers: default_servers(),
            peers: Vec::new(),
            hostname: None,
            port: 0,
            context: None,
        }
    }

    pub fn with_iteration_length(mut self, length: Duration) -> Self {
        self.iteration_length = length;
        self
    }

    pub fn with_dictatorship_length(mut self, length: Duration) -> Self {
        self.dictatorship_length = Some(length);
        self
    }

    pub fn with_servers(mut self, servers: Vec<String>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_peers(mut self, peers: Vec<WorkerUri>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Effective dictatorship window, saturating on overflow
    pub fn dictatorship_length(&self) -> Duration {
        self.dictatorship_length.unwrap_or_else(|| {
            self.iteration_length
                .checked_mul(DICTATORSHIP_FACTOR)
                .unwrap_or(Duration::MAX)
        })
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.group.name();
        if name.is_empty() {
            return Err(ConfigError::EmptyGroup);
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::InvalidGroup(name.to_string()));
        }
        if self.group.restart_key().len() > MAX_KEY_LEN {
            return Err(ConfigError::GroupTooLong(name.to_string()));
        }
        if self.bucket_count == 0 {
            return Err(ConfigError::NoBuckets);
        }
        if self.iteration_length.is_zero() {
            return Err(ConfigError::ZeroIteration);
        }
        if self.iteration_length > MAX_LEASE_LENGTH {
            return Err(ConfigError::LeaseTooLong {
                field: "iteration_length",
                length: self.iteration_length,
            });
        }
        let dictatorship = self.dictatorship_length();
        if dictatorship > MAX_LEASE_LENGTH {
            return Err(ConfigError::LeaseTooLong {
                field: "dictatorship_length",
                length: dictatorship,
            });
        }
        if dictatorship < self.iteration_length {
            return Err(ConfigError::DictatorshipTooShort {
                dictatorship,
                iteration: self.iteration_length,
            });
        }
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
