// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease-based leader election
//!
//! The lease token names the leader and expires after a TTL. A worker's local
//! view of its term is `iteration_end`: it is the leader while that instant is
//! in the future and the token names it.
//!
//! All workers of a group must account TTLs on comparably synchronized
//! clocks. Skew is not compensated.

use crate::worker::Worker;
use crate::{BucketProcessor, WorkerError};
use sq_adapters::{Directory, LeaseError, LeaseStore, PeerChannel};
use sq_core::{Clock, WorkerUri, MAX_LEASE_LENGTH};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Shortest wait suggested to a requester when the queue is empty
pub const MIN_BUCKET_HINT: Duration = Duration::from_secs(1);

/// Wait suggested alongside a bucket response
///
/// Half the time left in the iteration, at least [`MIN_BUCKET_HINT`] and at
/// most half an iteration.
pub fn bucket_hint(until_next_iteration: Duration, iteration_length: Duration) -> Duration {
    (until_next_iteration / 2)
        .max(MIN_BUCKET_HINT)
        .min(iteration_length / 2)
}

/// `now + after`, clamped to the longest lease
pub(crate) fn deadline(now: Instant, after: Duration) -> Instant {
    now.checked_add(after.min(MAX_LEASE_LENGTH)).unwrap_or(now)
}

impl<L, P, D, C, H> Worker<L, P, D, C, H>
where
    L: LeaseStore,
    P: PeerChannel,
    D: Directory,
    C: Clock,
    H: BucketProcessor,
{
    /// Try to create the token for this worker, returning whether it won
    ///
    /// Losing is the normal follower case. Whatever the outcome, a fresh
    /// iteration starts and the cached leader is forgotten.
    pub async fn nominate(&self) -> Result<bool, LeaseError> {
        let iteration = self.config.iteration_length;
        let result = self
            .lease
            .create_if_absent(&self.token_key, self.uri.as_str(), iteration)
            .await;
        {
            let mut state = self.state();
            state.iteration_end = deadline(self.clock.now(), iteration);
            state.leader = None;
        }
        let won = result?;
        if won {
            tracing::debug!("won nomination");
        }
        Ok(won)
    }

    /// Overwrite the token with this worker for `duration`; the current
    /// iteration and term then end exactly when the token does
    pub async fn seize_leadership(&self, duration: Duration) -> Result<(), LeaseError> {
        self.lease
            .set(&self.token_key, self.uri.as_str(), duration)
            .await?;
        let mut state = self.state();
        let end = deadline(self.clock.now(), duration);
        state.iteration_end = end;
        state.term_end = end;
        state.leader = Some(self.uri.clone());
        Ok(())
    }

    pub fn until_next_iteration(&self) -> Duration {
        let iteration_end = self.state().iteration_end;
        iteration_end.saturating_duration_since(self.clock.now())
    }

    /// Time left on the token this worker last wrote
    ///
    /// Unlike the iteration, nominations by the main loop do not extend it.
    pub fn until_term_end(&self) -> Duration {
        let term_end = self.state().term_end;
        term_end.saturating_duration_since(self.clock.now())
    }

    /// Current token holder, read through a cache that nomination clears
    pub async fn leader_uri(&self) -> Result<Option<WorkerUri>, LeaseError> {
        let cached = self.state().leader.clone();
        if cached.is_some() {
            return Ok(cached);
        }
        let leader = self.lease.get(&self.token_key).await?.map(WorkerUri::new);
        self.state().leader = leader.clone();
        Ok(leader)
    }

    pub fn invalidate_leader(&self) {
        self.state().leader = None;
    }

    /// Local view: the iteration is running and the token names this worker
    pub async fn is_leader(&self) -> Result<bool, LeaseError> {
        if self.until_next_iteration().is_zero() {
            return Ok(false);
        }
        Ok(self.leader_uri().await?.as_ref() == Some(&self.uri))
    }

    /// Run `operation` under an extended lease
    ///
    /// The token is held for the dictatorship window while `operation` runs.
    /// Leadership is then re-read from the store; finding it lost is an error.
    /// Otherwise the normal iteration window is restored.
    pub async fn as_dictator<T, F>(&self, operation: F) -> Result<T, WorkerError>
    where
        F: Future<Output = Result<T, WorkerError>>,
    {
        let duration = self.config.dictatorship_length();
        tracing::debug!(duration_ms = duration.as_millis() as u64, "becoming dictator");
        self.seize_leadership(duration).await?;

        let value = operation.await?;

        self.invalidate_leader();
        if !self.is_leader().await? {
            return Err(WorkerError::LostDictatorship { duration });
        }
        self.seize_leadership(self.config.iteration_length).await?;
        Ok(value)
    }

    /// Whether an operator has asked the group to restart
    pub async fn restart_wanted(&self) -> Result<bool, LeaseError> {
        Ok(self.lease.get(&self.restart_key).await?.is_some())
    }
}

#[cfg(test)]
#[path = "election_tests.rs"]
mod tests;
