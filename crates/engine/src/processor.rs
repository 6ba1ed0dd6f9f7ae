// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The host side of a worker: what to do with a bucket

use crate::BucketQueue;
use async_trait::async_trait;

/// Error returned by a processor
pub type ProcessError = Box<dyn std::error::Error + Send + Sync>;

/// Work performed for each assigned bucket, plus leader extension hooks
///
/// Buckets handed out by a leader that crashes mid-term may be handed out
/// again by its successor, so `process` must tolerate redelivery.
#[async_trait]
pub trait BucketProcessor: Send + Sync + 'static {
    /// Process one bucket. Errors are logged and the worker moves on.
    async fn process(&self, bucket: u32) -> Result<(), ProcessError>;

    /// Runs once at the start of every leader term, before the queue is built
    async fn before_leader_duties(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Called periodically by the leader while the queue still holds buckets
    /// and no restart is pending
    fn update_buckets(&self, _queue: &mut BucketQueue) {}
}
