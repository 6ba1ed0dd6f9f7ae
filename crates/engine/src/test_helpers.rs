// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for worker unit tests

use crate::{BucketProcessor, BucketQueue, ProcessError, Worker, WorkerDeps};
use async_trait::async_trait;
use sq_adapters::{FakeLeaseStore, FakePeerNetwork, StaticDirectory};
use sq_core::{FakeClock, WorkerConfig, WorkerUri};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type TestWorker =
    Worker<FakeLeaseStore, FakePeerNetwork, StaticDirectory, FakeClock, RecordingProcessor>;

/// Records processed buckets; optionally pops a bucket on every update
#[derive(Clone, Default)]
pub struct RecordingProcessor {
    pub(crate) processed: Arc<Mutex<Vec<u32>>>,
    pub(crate) updates: Arc<Mutex<usize>>,
    pub(crate) terms: Arc<Mutex<usize>>,
    pub pop_on_update: bool,
    pub fail: bool,
    pub fail_before_duties: bool,
}

impl RecordingProcessor {
    pub fn processed(&self) -> Vec<u32> {
        self.processed.lock().unwrap().clone()
    }

    pub fn updates(&self) -> usize {
        *self.updates.lock().unwrap()
    }

    /// Leader terms started
    pub fn terms(&self) -> usize {
        *self.terms.lock().unwrap()
    }
}

#[async_trait]
impl BucketProcessor for RecordingProcessor {
    async fn process(&self, bucket: u32) -> Result<(), ProcessError> {
        self.processed.lock().unwrap().push(bucket);
        if self.fail {
            return Err(format!("bucket {} failed", bucket).into());
        }
        Ok(())
    }

    async fn before_leader_duties(&self) -> Result<(), ProcessError> {
        *self.terms.lock().unwrap() += 1;
        if self.fail_before_duties {
            return Err("hook failed".into());
        }
        Ok(())
    }

    fn update_buckets(&self, queue: &mut BucketQueue) {
        *self.updates.lock().unwrap() += 1;
        if self.pop_on_update {
            queue.pop();
        }
    }
}

/// One fake world shared by every worker of a test
#[derive(Clone)]
pub struct Harness {
    pub clock: FakeClock,
    pub lease: FakeLeaseStore,
    pub network: FakePeerNetwork,
    pub peers: Vec<WorkerUri>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        Self {
            lease: FakeLeaseStore::new(clock.clone()),
            clock,
            network: FakePeerNetwork::new(),
            peers: Vec::new(),
        }
    }

    pub fn with_peers(mut self, peers: &[&str]) -> Self {
        self.peers = peers.iter().map(|p| WorkerUri::new(*p)).collect();
        self
    }

    /// Group "jobs", iteration 10s, dictatorship 100s
    pub fn config(bucket_count: u32) -> WorkerConfig {
        WorkerConfig::new("jobs", bucket_count)
            .with_iteration_length(Duration::from_secs(10))
            .with_dictatorship_length(Duration::from_secs(100))
    }

    /// Build a worker and register it on the network
    pub fn worker(&self, uri: &str, config: WorkerConfig, processor: RecordingProcessor) -> Arc<TestWorker> {
        let worker = Arc::new(Worker::new(
            WorkerUri::new(uri),
            config,
            WorkerDeps {
                lease: self.lease.clone(),
                peers: self.network.clone(),
                directory: StaticDirectory::new(self.peers.clone()),
                processor,
            },
            self.clock.clone(),
        ));
        self.network.register(WorkerUri::new(uri), worker.clone());
        worker
    }
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
