// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::lease::{LeaseError, LeaseStore};
use crate::peer::{PeerChannel, PeerError};
use async_trait::async_trait;
use serde_json::Value;
use sq_core::{BucketResponse, WorkerUri};
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any LeaseStore
#[derive(Clone)]
pub struct TracedLeaseStore<L> {
    inner: L,
}

impl<L> TracedLeaseStore<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<L: LeaseStore> LeaseStore for TracedLeaseStore<L> {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        let span = tracing::info_span!("lease.add", key, value);
        async {
            require_key(key)?;

            let start = std::time::Instant::now();
            let result = self.inner.create_if_absent(key, value, ttl).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(created) => {
                    let ttl_ms = ttl.as_millis() as u64;
                    tracing::debug!(created, ttl_ms, elapsed_ms, "added")
                }
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "add failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LeaseError> {
        let span = tracing::info_span!("lease.set", key, value);
        async {
            require_key(key)?;

            let start = std::time::Instant::now();
            let result = self.inner.set(key, value, ttl).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(ttl_ms = ttl.as_millis() as u64, elapsed_ms, "stored"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "set failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseError> {
        require_key(key)?;
        let result = self.inner.get(key).await;
        match &result {
            Ok(value) => tracing::trace!(key, value = ?value, "read"),
            Err(e) => tracing::warn!(key, error = %e, "get failed"),
        }
        result
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseError> {
        let span = tracing::info_span!("lease.delete", key);
        async {
            require_key(key)?;
            let result = self.inner.delete(key).await;
            match &result {
                Ok(()) => tracing::info!("deleted"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Precondition shared by every lease call: the key must not be empty
fn require_key(key: &str) -> Result<(), LeaseError> {
    if key.is_empty() {
        tracing::error!("empty lease key");
        return Err(LeaseError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Wrapper that adds tracing to any PeerChannel
#[derive(Clone)]
pub struct TracedPeerChannel<P> {
    inner: P,
}

impl<P> TracedPeerChannel<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: PeerChannel> PeerChannel for TracedPeerChannel<P> {
    async fn bucket_request(
        &self,
        peer: &WorkerUri,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, PeerError> {
        let span = tracing::info_span!("peer.bucket_request", %peer);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.bucket_request(peer, requester, context).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => tracing::debug!(
                    item = %response.item,
                    hint_ms = response.hint.as_millis() as u64,
                    elapsed_ms,
                    "assigned"
                ),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "bucket request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn probe_alive(&self, peer: &WorkerUri) -> Result<bool, PeerError> {
        let result = self.inner.probe_alive(peer).await;
        tracing::trace!(%peer, alive = ?result.as_ref().ok(), "probed");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
