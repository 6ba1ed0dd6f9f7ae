// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket assignment types exchanged between a leader and its requesters

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a leader hands out in answer to a bucket request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "bucket", rename_all = "snake_case")]
pub enum Assignment {
    /// Process this bucket index
    Bucket(u32),
    /// The queue is drained for this iteration; wait for the hint
    Empty,
    /// The answering worker does not hold leadership
    NotLeader,
    /// A restart drain is in progress; the requester must shut down
    Stop,
}

/// Answer to a bucket request: the assignment plus a suggested wait
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketResponse {
    pub item: Assignment,
    #[serde(with = "humantime_serde")]
    pub hint: Duration,
}

impl BucketResponse {
    pub fn new(item: Assignment, hint: Duration) -> Self {
        Self { item, hint }
    }

    pub fn not_leader() -> Self {
        Self::new(Assignment::NotLeader, Duration::ZERO)
    }

    pub fn stop() -> Self {
        Self::new(Assignment::Stop, Duration::ZERO)
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assignment::Bucket(bucket) => write!(f, "bucket {}", bucket),
            Assignment::Empty => write!(f, "empty"),
            Assignment::NotLeader => write!(f, "not_leader"),
            Assignment::Stop => write!(f, "stop"),
        }
    }
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;
