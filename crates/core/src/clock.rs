// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Iteration windows, lease TTLs and relax intervals all go through a [`Clock`],
//! so a worker can be driven by real time, by tokio's paused test time, or by a
//! [`FakeClock`] that only moves when told to.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A clock that provides the current time and can suspend the caller
#[async_trait]
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real system clock, backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fake clock for testing with controllable time
///
/// Sleeping on a fake clock advances it by the requested duration and records
/// the request, so tests can assert on relax intervals without waiting.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Set the clock to a specific instant
    pub fn set(&self, instant: Instant) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }

    /// Every duration passed to [`Clock::sleep`], in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
        // Give concurrent tasks a chance to observe the new time
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
