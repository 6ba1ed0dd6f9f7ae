// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service directory: the peer list of a group
//!
//! The leader uses it once per restart to decide whom to drain. Membership is
//! not otherwise tracked.

use async_trait::async_trait;
use sq_core::{Group, WorkerUri};
use std::sync::Arc;
use thiserror::Error;

/// Errors from directory lookups
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory lookup for group {group} failed: {message}")]
    Lookup { group: Group, message: String },
}

/// Adapter listing the peer uris registered for a group
#[async_trait]
pub trait Directory: Clone + Send + Sync + 'static {
    async fn list_peers(&self, group: &Group) -> Result<Vec<WorkerUri>, DirectoryError>;
}

/// Directory backed by a fixed peer list
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    peers: Arc<Vec<WorkerUri>>,
}

impl StaticDirectory {
    pub fn new(peers: impl IntoIterator<Item = WorkerUri>) -> Self {
        Self {
            peers: Arc::new(peers.into_iter().collect()),
        }
    }

    pub fn peers(&self) -> &[WorkerUri] {
        &self.peers
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn list_peers(&self, _group: &Group) -> Result<Vec<WorkerUri>, DirectoryError> {
        Ok(self.peers.to_vec())
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
