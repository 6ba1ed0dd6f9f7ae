// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process peer network for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PeerChannel, PeerError, PeerHandler};
use async_trait::async_trait;
use serde_json::Value;
use sq_core::{BucketResponse, WorkerUri};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Recorded peer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    BucketRequest {
        peer: WorkerUri,
        requester: WorkerUri,
    },
    ProbeAlive {
        peer: WorkerUri,
    },
}

/// Routes peer calls straight to registered handlers
///
/// Every clone shares the same routing table, so one network can be handed to
/// several workers. Unregistered or partitioned uris are unreachable.
#[derive(Clone, Default)]
pub struct FakePeerNetwork {
    handlers: Arc<Mutex<HashMap<WorkerUri, Arc<dyn PeerHandler>>>>,
    partitioned: Arc<Mutex<HashSet<WorkerUri>>>,
    calls: Arc<Mutex<Vec<PeerCall>>>,
}

impl FakePeerNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `handler` at `uri`
    pub fn register(&self, uri: WorkerUri, handler: Arc<dyn PeerHandler>) {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(uri, handler);
    }

    /// Stop serving `uri`, as when its process exits
    pub fn disconnect(&self, uri: &WorkerUri) {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(uri);
    }

    /// Make `uri` unreachable without forgetting its handler
    pub fn partition(&self, uri: &WorkerUri) {
        self.partitioned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(uri.clone());
    }

    pub fn heal(&self, uri: &WorkerUri) {
        self.partitioned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(uri);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<PeerCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: PeerCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn route(&self, peer: &WorkerUri) -> Result<Arc<dyn PeerHandler>, PeerError> {
        let partitioned = self
            .partitioned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(peer);
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(peer)
            .cloned();
        match handler {
            Some(handler) if !partitioned => Ok(handler),
            _ => Err(PeerError::Unreachable {
                peer: peer.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "no handler at address",
                ),
            }),
        }
    }
}

#[async_trait]
impl PeerChannel for FakePeerNetwork {
    async fn bucket_request(
        &self,
        peer: &WorkerUri,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, PeerError> {
        self.record(PeerCall::BucketRequest {
            peer: peer.clone(),
            requester: requester.clone(),
        });
        let handler = self.route(peer)?;
        handler
            .bucket_request(requester, context)
            .await
            .map_err(|e| PeerError::Remote {
                peer: peer.clone(),
                message: e.to_string(),
            })
    }

    async fn probe_alive(&self, peer: &WorkerUri) -> Result<bool, PeerError> {
        self.record(PeerCall::ProbeAlive { peer: peer.clone() });
        Ok(self.route(peer)?.alive())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
