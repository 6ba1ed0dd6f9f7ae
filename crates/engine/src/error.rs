// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the worker

use crate::ProcessError;
use sq_adapters::{DirectoryError, LeaseError, PeerError};
use sq_core::WorkerUri;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("lease store error: {0}")]
    Lease(#[from] LeaseError),
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("cannot reach self at {uri}: {source}")]
    SelfUnreachable {
        uri: WorkerUri,
        #[source]
        source: PeerError,
    },
    #[error("self at {0} is not alive")]
    NotAlive(WorkerUri),
    #[error("cannot determine leader")]
    Anarchy,
    #[error("lost leadership while being dictator for {duration:?}")]
    LostDictatorship { duration: Duration },
    #[error("processor hook failed: {0}")]
    Hook(ProcessError),
}

impl WorkerError {
    /// Connectivity failures are retried after relaxing; everything else
    /// means the coordination guarantee may be broken
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WorkerError::Lease(_) | WorkerError::Peer(_) | WorkerError::Directory(_)
        )
    }
}
