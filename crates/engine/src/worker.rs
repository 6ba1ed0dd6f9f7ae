// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker state and the bucket distribution endpoint

use crate::election::{bucket_hint, deadline};
use crate::{BucketProcessor, BucketQueue, Exit, WorkerError};
use async_trait::async_trait;
use serde_json::Value;
use sq_adapters::{Directory, HandlerError, LeaseStore, PeerChannel, PeerHandler};
use sq_core::{Assignment, BucketResponse, Clock, WorkerConfig, WorkerUri};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Collaborators a worker is built from
pub struct WorkerDeps<L, P, D, H> {
    pub lease: L,
    pub peers: P,
    pub directory: D,
    pub processor: H,
}

/// Mutable state shared by the main loop, the duty task and inbound requests
///
/// Guarded by a single mutex that is never held across an await.
pub(crate) struct WorkerState {
    pub(crate) iteration_end: Instant,
    /// When the token this worker last wrote expires
    pub(crate) term_end: Instant,
    pub(crate) leader: Option<WorkerUri>,
    pub(crate) queue: BucketQueue,
}

/// One member of a worker group
pub struct Worker<L, P, D, C, H> {
    pub(crate) uri: WorkerUri,
    pub(crate) config: WorkerConfig,
    pub(crate) token_key: String,
    pub(crate) restart_key: String,
    pub(crate) lease: L,
    pub(crate) peers: P,
    pub(crate) directory: D,
    pub(crate) processor: H,
    pub(crate) clock: C,
    pub(crate) state: Mutex<WorkerState>,
    pub(crate) duty: Mutex<Option<JoinHandle<()>>>,
    pub(crate) exit: watch::Sender<Option<Exit>>,
}

impl<L, P, D, C, H> Worker<L, P, D, C, H>
where
    L: LeaseStore,
    P: PeerChannel,
    D: Directory,
    C: Clock,
    H: BucketProcessor,
{
    pub fn new(uri: WorkerUri, config: WorkerConfig, deps: WorkerDeps<L, P, D, H>, clock: C) -> Self {
        let now = clock.now();
        let iteration_end = deadline(now, config.iteration_length);
        let (exit, _) = watch::channel(None);
        Self {
            uri,
            token_key: config.group.token_key(),
            restart_key: config.group.restart_key(),
            config,
            lease: deps.lease,
            peers: deps.peers,
            directory: deps.directory,
            processor: deps.processor,
            clock,
            state: Mutex::new(WorkerState {
                iteration_end,
                term_end: now,
                leader: None,
                queue: BucketQueue::new(),
            }),
            duty: Mutex::new(None),
            exit,
        }
    }

    pub fn uri(&self) -> &WorkerUri {
        &self.uri
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn queued_buckets(&self) -> usize {
        self.state().queue.len()
    }

    /// Serve a bucket request from `requester`
    ///
    /// A non-leader answers `NotLeader` without touching its queue. A leader
    /// pops the next bucket; once the queue is empty, a requester owed a stop
    /// gets `Stop` exactly once. The leader itself is never stopped this way.
    pub async fn bucket_request(
        &self,
        requester: &WorkerUri,
        _context: Option<&Value>,
    ) -> Result<BucketResponse, WorkerError> {
        if !self.is_leader().await? {
            tracing::debug!(%requester, "not leader");
            return Ok(BucketResponse::not_leader());
        }

        let hint = bucket_hint(self.until_next_iteration(), self.config.iteration_length);
        let mut state = self.state();
        let item = match state.queue.pop() {
            Some(bucket) => Assignment::Bucket(bucket),
            None => {
                if requester != &self.uri && state.queue.take_stop(requester) {
                    tracing::info!(%requester, "delivering stop");
                    return Ok(BucketResponse::stop());
                }
                Assignment::Empty
            }
        };
        tracing::debug!(%requester, %item, "delivering bucket");
        Ok(BucketResponse::new(item, hint))
    }
}

#[async_trait]
impl<L, P, D, C, H> PeerHandler for Worker<L, P, D, C, H>
where
    L: LeaseStore,
    P: PeerChannel,
    D: Directory,
    C: Clock,
    H: BucketProcessor,
{
    async fn bucket_request(
        &self,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, HandlerError> {
        Ok(Worker::bucket_request(self, requester, context).await?)
    }

    fn alive(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
