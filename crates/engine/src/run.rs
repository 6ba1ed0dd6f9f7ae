// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker main loop

use crate::worker::Worker;
use crate::{BucketProcessor, WorkerError};
use sq_adapters::{Directory, LeaseStore, PeerChannel};
use sq_core::{Assignment, BucketResponse, Clock, WorkerUri};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Leader lookups retried before giving up with [`WorkerError::Anarchy`]
const LEADER_LOOKUP_ATTEMPTS: usize = 2;

/// Why a worker stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// The leader handed this worker a stop during a restart drain
    Stopped,
    /// This worker led a restart drain to completion
    Drained,
}

impl<L, P, D, C, H> Worker<L, P, D, C, H>
where
    L: LeaseStore,
    P: PeerChannel,
    D: Directory,
    C: Clock,
    H: BucketProcessor,
{
    /// Pull and process buckets until the worker is stopped or drained
    ///
    /// Connectivity failures are retried after relaxing until the next
    /// iteration. A worker that cannot reach itself, or that finds no leader,
    /// returns the error.
    pub async fn run(self: &Arc<Self>) -> Result<Exit, WorkerError> {
        let span = tracing::info_span!("worker", group = %self.config.group, uri = %self.uri);
        async {
            tracing::info!(bucket_count = self.config.bucket_count, "registered");
            loop {
                let outcome = self.step().await;
                if let Some(exit) = self.exit_requested() {
                    return Ok(exit);
                }
                match outcome {
                    Ok(Some(exit)) => {
                        self.finish(exit);
                        return Ok(exit);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "worker failed");
                        return Err(e);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// One main-loop tick, relaxing on transient errors
    pub(crate) async fn step(self: &Arc<Self>) -> Result<Option<Exit>, WorkerError> {
        match self.tick().await {
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "relaxing until next iteration");
                self.relax(self.until_next_iteration()).await;
                Ok(None)
            }
            outcome => outcome,
        }
    }

    async fn tick(self: &Arc<Self>) -> Result<Option<Exit>, WorkerError> {
        self.check_self_reachable().await?;
        if self.nominate().await? {
            // The previous term's token lapsed, so its task has nothing left to do
            self.abort_leader_duties();
        }
        if self.is_leader().await? {
            self.spawn_leader_duties().await;
        }

        let leader = self.leader().await?;
        let response = self
            .peers
            .bucket_request(&leader, &self.uri, self.config.context.as_ref())
            .await?;
        Ok(self.bucket_process(response).await)
    }

    async fn check_self_reachable(&self) -> Result<(), WorkerError> {
        match self.peers.probe_alive(&self.uri).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(WorkerError::NotAlive(self.uri.clone())),
            Err(source) => Err(WorkerError::SelfUnreachable {
                uri: self.uri.clone(),
                source,
            }),
        }
    }

    /// Resolve the leader, relaxing between attempts
    async fn leader(&self) -> Result<WorkerUri, WorkerError> {
        for _ in 0..LEADER_LOOKUP_ATTEMPTS {
            if let Some(leader) = self.leader_uri().await? {
                return Ok(leader);
            }
            tracing::debug!("could not determine leader, relaxing until next iteration");
            self.relax(self.until_next_iteration()).await;
        }
        self.leader_uri().await?.ok_or(WorkerError::Anarchy)
    }

    async fn bucket_process(&self, response: BucketResponse) -> Option<Exit> {
        match response.item {
            Assignment::Bucket(bucket) => {
                tracing::info!(bucket, "processing");
                if let Err(e) = self.processor.process(bucket).await {
                    tracing::error!(bucket, error = %e, "bucket processing failed");
                }
                None
            }
            Assignment::Empty => {
                tracing::info!(
                    hint_ms = response.hint.as_millis() as u64,
                    "no more buckets in this iteration"
                );
                self.relax(response.hint).await;
                None
            }
            Assignment::NotLeader => {
                tracing::warn!("received not_leader from peer");
                self.invalidate_leader();
                tokio::task::yield_now().await;
                None
            }
            Assignment::Stop => {
                tracing::info!("received stop from leader");
                Some(Exit::Stopped)
            }
        }
    }

    /// Sleep for `duration`, waking early once the worker is exiting
    pub(crate) async fn relax(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let mut exit = self.exit.subscribe();
        tokio::select! {
            _ = self.clock.sleep(duration) => {}
            _ = exit.wait_for(Option::is_some) => {}
        }
    }

    /// Record the first exit reason; later ones are ignored
    pub(crate) fn finish(&self, exit: Exit) {
        self.exit.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(exit);
            true
        });
    }

    pub fn exit_requested(&self) -> Option<Exit> {
        *self.exit.borrow()
    }

    /// Release leadership before the process exits
    ///
    /// Stops the duty task. If this worker still holds the token, the token
    /// and the restart flag are deleted so the group can elect a successor at
    /// once.
    pub async fn cleanup(&self) -> Result<(), WorkerError> {
        self.abort_leader_duties();
        self.invalidate_leader();
        if self.is_leader().await? {
            self.lease.delete(&self.token_key).await?;
            self.lease.delete(&self.restart_key).await?;
            tracing::info!(uri = %self.uri, "released leadership");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
