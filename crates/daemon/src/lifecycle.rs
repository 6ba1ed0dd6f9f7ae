// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use sq_adapters::{
    MemcacheLeaseStore, PeerServer, StaticDirectory, TcpPeerChannel, TracedLeaseStore,
    TracedPeerChannel,
};
use sq_core::{ConfigError, Group, SystemClock, WorkerConfig, WorkerUri};
use sq_engine::{Worker, WorkerDeps};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::shell::ShellProcessor;

/// Worker with concrete adapter types (wrapped with tracing)
pub type DaemonWorker = Worker<
    TracedLeaseStore<MemcacheLeaseStore>,
    TracedPeerChannel<TcpPeerChannel>,
    StaticDirectory,
    SystemClock,
    ShellProcessor,
>;

/// Host the worker endpoint binds when no hostname is configured
const DEFAULT_BIND_HOST: &str = "127.0.0.1";

/// Daemon configuration: the worker's registration plus process options
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub worker: WorkerConfig,
    /// Shell command run for every bucket
    #[serde(default)]
    pub exec: Option<String>,
    /// Log file; logs go to stderr when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Coordination group
    #[arg(long)]
    pub group: Option<String>,
    /// Number of buckets in the group
    #[arg(long)]
    pub bucket_count: Option<u32>,
    /// Length of one iteration (e.g. "10s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub iteration_length: Option<Duration>,
    /// Lease extension around multi-step leader operations (e.g. "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub dictatorship_length: Option<Duration>,
    /// Lease store endpoint (repeatable)
    #[arg(long = "server")]
    pub servers: Vec<String>,
    /// Host the worker binds and advertises
    #[arg(long)]
    pub hostname: Option<String>,
    /// Port of the worker endpoint
    #[arg(long)]
    pub port: Option<u16>,
    /// Shell command run for every bucket
    #[arg(long)]
    pub exec: Option<String>,
    /// Write logs to this file instead of stderr
    #[arg(long, env = "SQ_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load `path`, apply `overrides`, then validate the result
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, LifecycleError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(ConfigError::Parse)?;
        let config = config.with_overrides(overrides);
        config.worker.validate()?;
        Ok(config)
    }

    fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(group) = overrides.group {
            self.worker.group = Group::new(group);
        }
        if let Some(count) = overrides.bucket_count {
            self.worker.bucket_count = count;
        }
        if let Some(length) = overrides.iteration_length {
            self.worker.iteration_length = length;
        }
        if overrides.dictatorship_length.is_some() {
            self.worker.dictatorship_length = overrides.dictatorship_length;
        }
        if !overrides.servers.is_empty() {
            self.worker.servers = overrides.servers;
        }
        if overrides.hostname.is_some() {
            self.worker.hostname = overrides.hostname;
        }
        if let Some(port) = overrides.port {
            self.worker.port = port;
        }
        if overrides.exec.is_some() {
            self.exec = overrides.exec;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self
    }
}

/// Running daemon: the worker and the endpoint serving its peers
pub struct DaemonState {
    pub worker: Arc<DaemonWorker>,
    server: PeerServer,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Release leadership and stop serving peers
    ///
    /// Lease cleanup is best effort: a failure is logged and the token is left
    /// to expire.
    pub async fn shutdown(self) {
        info!("Shutting down daemon...");
        if let Err(e) = self.worker.cleanup().await {
            warn!(error = %e, "failed to release leadership");
        }
        self.server.shutdown().await;
        info!(
            uptime_s = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind worker endpoint at {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Invalid log file path: {0}")]
    InvalidLogPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind the worker endpoint and start serving peers
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let worker_config = &config.worker;
    let host = worker_config
        .hostname
        .as_deref()
        .unwrap_or(DEFAULT_BIND_HOST);
    let bind_addr = format!("{}:{}", host, worker_config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(bind_addr.clone(), e))?;
    let uri = WorkerUri::advertised(listener.local_addr()?, worker_config.hostname.as_deref());

    let deps = WorkerDeps {
        lease: TracedLeaseStore::new(MemcacheLeaseStore::new(&worker_config.servers)),
        peers: TracedPeerChannel::new(TcpPeerChannel::new()),
        directory: StaticDirectory::new(worker_config.peers.clone()),
        processor: ShellProcessor::new(config.exec.clone(), worker_config),
    };
    let worker = Arc::new(Worker::new(
        uri,
        worker_config.clone(),
        deps,
        SystemClock,
    ));
    let server = PeerServer::start(listener, worker.clone())?;

    info!(
        group = %worker_config.group,
        uri = %worker.uri(),
        listen = %server.local_addr(),
        servers = ?worker_config.servers,
        "Daemon started"
    );

    Ok(DaemonState {
        worker,
        server,
        start_time: Instant::now(),
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
