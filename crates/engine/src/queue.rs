// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader-owned bucket pool and restart bookkeeping

use sq_core::WorkerUri;
use std::collections::BTreeSet;

/// Unclaimed buckets of the current term and the followers still owed a stop
#[derive(Debug, Default, Clone)]
pub struct BucketQueue {
    buckets: Vec<u32>,
    followers_to_stop: BTreeSet<WorkerUri>,
}

impl BucketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a term: every index in `0..count`, nobody to stop
    pub fn initialize(&mut self, count: u32) {
        self.buckets.clear();
        self.buckets.extend(0..count);
        self.followers_to_stop.clear();
    }

    pub fn pop(&mut self) -> Option<u32> {
        self.buckets.pop()
    }

    pub fn push(&mut self, bucket: u32) {
        self.buckets.push(bucket);
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn replace_followers_to_stop(&mut self, followers: impl IntoIterator<Item = WorkerUri>) {
        self.followers_to_stop = followers.into_iter().collect();
    }

    /// Remove `requester` from the stop set, returning whether it was owed a stop
    pub fn take_stop(&mut self, requester: &WorkerUri) -> bool {
        self.followers_to_stop.remove(requester)
    }

    pub fn followers_to_stop(&self) -> Vec<WorkerUri> {
        self.followers_to_stop.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
