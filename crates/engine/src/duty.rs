// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader duty cycle
//!
//! Runs as its own task beside the main loop while this worker leads:
//! builds the queue, keeps the lease renewed while followers drain it, and
//! on a restart request stops every reachable follower before exiting.
//!
//! Every wait is measured against the token this task last wrote, so the
//! task ends no later than its term does.

use crate::worker::Worker;
use crate::{BucketProcessor, Exit, WorkerError};
use sq_adapters::{Directory, LeaseStore, PeerChannel};
use sq_core::{Clock, WorkerUri};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::Instrument;

/// How a leader term ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermOutcome {
    /// The queue was drained and the iteration ran out
    Ended,
    /// A restart drain stopped every reachable follower
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
    /// Run one leader term
    pub async fn perform_leader_duties(&self) -> Result<TermOutcome, WorkerError> {
        self.lead_term(None).await
    }

    /// Run one leader term, signalling `initialized` once the queue is built
    async fn lead_term(
        &self,
        initialized: Option<oneshot::Sender<()>>,
    ) -> Result<TermOutcome, WorkerError> {
        self.processor
            .before_leader_duties()
            .await
            .map_err(WorkerError::Hook)?;

        self.as_dictator(async {
            self.state().queue.initialize(self.config.bucket_count);
            Ok(())
        })
        .await?;
        tracing::info!(bucket_count = self.config.bucket_count, "initialized buckets");
        if let Some(initialized) = initialized {
            let _ = initialized.send(());
        }

        // Renew at sub-iteration granularity while followers drain the queue
        while !self.queue_is_empty() {
            if self.exit_requested().is_some() {
                return Ok(TermOutcome::Ended);
            }
            self.relax(self.until_term_end() / 2).await;
            self.as_dictator(async {
                if !self.restart_wanted().await? {
                    let mut state = self.state();
                    self.processor.update_buckets(&mut state.queue);
                }
                Ok::<_, WorkerError>(())
            })
            .await?;
        }

        if !self.restart_wanted().await? {
            self.relax(self.until_term_end()).await;
            return Ok(TermOutcome::Ended);
        }

        tracing::info!("restart requested, stopping followers");
        self.as_dictator(self.populate_followers_to_stop()).await?;

        loop {
            let pending = self.reachable_followers_to_stop().await;
            if pending.is_empty() || self.exit_requested().is_some() {
                break;
            }
            tracing::debug!(pending = pending.len(), "waiting for followers to stop");
            self.relax(self.until_term_end() / 2).await;
            self.seize_leadership(self.config.iteration_length).await?;
        }
        Ok(TermOutcome::Drained)
    }

    /// Start the duty cycle unless one is already running
    ///
    /// A fresh term returns once its queue is built, or once the task has
    /// given up before building it, so the first request sees the buckets.
    pub async fn spawn_leader_duties(self: &Arc<Self>) {
        let Some(initialized) = self.start_leader_duties() else {
            return;
        };
        let _ = initialized.await;
    }

    fn start_leader_duties(self: &Arc<Self>) -> Option<oneshot::Receiver<()>> {
        let mut duty = self.duty.lock().unwrap_or_else(|e| e.into_inner());
        if duty.as_ref().is_some_and(|task| !task.is_finished()) {
            return None;
        }

        let (initialized, ready) = oneshot::channel();
        let worker = Arc::clone(self);
        let task = async move {
            tracing::info!("elected leader");
            match worker.lead_term(Some(initialized)).await {
                Ok(TermOutcome::Ended) => tracing::debug!("leader term ended"),
                Ok(TermOutcome::Drained) => {
                    tracing::info!("all followers stopped");
                    worker.finish(Exit::Drained);
                }
                Err(e) => tracing::error!(error = %e, "leader duties failed"),
            }
        };
        *duty = Some(tokio::spawn(task.instrument(tracing::Span::current())));
        Some(ready)
    }

    #[cfg(test)]
    pub(crate) fn leader_duties_running(&self) -> bool {
        self.duty
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Kill the duty task without releasing the lease
    pub fn abort_leader_duties(&self) {
        if let Some(task) = self.duty.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }

    fn queue_is_empty(&self) -> bool {
        self.state().queue.is_empty()
    }

    async fn populate_followers_to_stop(&self) -> Result<(), WorkerError> {
        let peers = self.directory.list_peers(&self.config.group).await?;
        let followers: Vec<WorkerUri> = peers.into_iter().filter(|p| *p != self.uri).collect();
        tracing::info!(count = followers.len(), "followers to stop");
        self.state().queue.replace_followers_to_stop(followers);
        Ok(())
    }

    /// Followers still owed a stop that answer a liveness probe
    ///
    /// Unreachable followers stay in the set but do not hold up the drain.
    async fn reachable_followers_to_stop(&self) -> Vec<WorkerUri> {
        let pending = self.state().queue.followers_to_stop();
        let mut reachable = Vec::with_capacity(pending.len());
        for follower in pending {
            if matches!(self.peers.probe_alive(&follower).await, Ok(true)) {
                reachable.push(follower);
            }
        }
        reachable
    }
}

#[cfg(test)]
#[path = "duty_tests.rs"]
mod tests;
