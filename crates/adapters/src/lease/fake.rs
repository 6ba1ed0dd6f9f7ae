// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lease store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LeaseError, LeaseStore, MemoryLeaseStore};
use async_trait::async_trait;
use sq_core::FakeClock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded lease store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseCall {
    CreateIfAbsent {
        key: String,
        value: String,
        ttl: Duration,
    },
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
}

#[derive(Default)]
struct Faults {
    unavailable: bool,
    drop_writes: bool,
}

/// Fake lease store for testing
///
/// Behaves like [`MemoryLeaseStore`] on a [`FakeClock`], records every call,
/// and can be told to fail or to silently lose writes.
#[derive(Clone)]
pub struct FakeLeaseStore {
    inner: MemoryLeaseStore<FakeClock>,
    calls: Arc<Mutex<Vec<LeaseCall>>>,
    faults: Arc<Mutex<Faults>>,
}

impl FakeLeaseStore {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            inner: MemoryLeaseStore::new(clock),
            calls: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<LeaseCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Make every call fail as if the server were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unavailable = unavailable;
    }

    /// Accept writes without storing them
    pub fn set_drop_writes(&self, drop_writes: bool) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drop_writes = drop_writes;
    }

    /// Read a key without recording the call
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.ok().flatten()
    }

    fn record(&self, call: LeaseCall) -> Result<(), LeaseError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        if self
            .faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unavailable
        {
            return Err(LeaseError::Unavailable {
                server: "fake".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "injected"),
            });
        }
        Ok(())
    }

    fn drops_writes(&self) -> bool {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drop_writes
    }
}

#[async_trait]
impl LeaseStore for FakeLeaseStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        self.record(LeaseCall::CreateIfAbsent {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        })?;
        if self.drops_writes() {
            return Ok(true);
        }
        self.inner.create_if_absent(key, value, ttl).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LeaseError> {
        self.record(LeaseCall::Set {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        })?;
        if self.drops_writes() {
            return Ok(());
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseError> {
        self.record(LeaseCall::Get {
            key: key.to_string(),
        })?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseError> {
        self.record(LeaseCall::Delete {
            key: key.to_string(),
        })?;
        self.inner.delete(key).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
