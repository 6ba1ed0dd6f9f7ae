// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store
//!
//! Shared by cloning: every clone sees the same entries. Useful for running
//! several workers of a group inside one process.

use super::{LeaseError, LeaseStore};
use async_trait::async_trait;
use sq_core::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => at > now,
            None => true,
        }
    }
}

/// Lease store held in memory, expiring entries against a [`Clock`]
#[derive(Clone)]
pub struct MemoryLeaseStore<C: Clock> {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: C,
}

impl<C: Clock> MemoryLeaseStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// A zero TTL, or one past the clock's range, never expires
    fn entry(&self, value: &str, ttl: Duration) -> Entry {
        Entry {
            value: value.to_string(),
            expires_at: (!ttl.is_zero())
                .then(|| self.clock.now().checked_add(ttl))
                .flatten(),
        }
    }
}

#[async_trait]
impl<C: Clock> LeaseStore for MemoryLeaseStore<C> {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(key.to_string(), self.entry(value, ttl));
        Ok(true)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LeaseError> {
        let entry = self.entry(value, ttl);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
