// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease store adapters
//!
//! A lease store is a shared key-value store whose entries expire after a TTL
//! and which offers an atomic create-if-absent. Leader election relies on that
//! atomicity across every worker of a group.

mod memcache;
mod memory;

pub use memcache::MemcacheLeaseStore;
pub use memory::MemoryLeaseStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLeaseStore, LeaseCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from lease store operations
///
/// All of them are connectivity or contract failures of the store itself; none
/// means "the key is held by someone else".
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("lease store {server} unreachable: {source}")]
    Unavailable {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("lease store {0} timed out")]
    Timeout(String),
    #[error("lease store protocol error: {0}")]
    Protocol(String),
    #[error("lease store rejected request: {0}")]
    Rejected(String),
    #[error("invalid lease key {0:?}")]
    InvalidKey(String),
}

/// Adapter for a TTL-bound shared key-value store
///
/// A zero `ttl` stores the value without expiry.
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// Store `value` under `key` only if the key has no live value.
    /// Returns whether this call created the entry.
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError>;

    /// Unconditionally overwrite `key`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LeaseError>;

    /// Read the live value of `key`
    async fn get(&self, key: &str) -> Result<Option<String>, LeaseError>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), LeaseError>;
}
