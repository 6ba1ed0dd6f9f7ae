// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sq-core: shared vocabulary for static bucket queue workers
//!
//! This crate provides:
//! - A clock abstraction so iteration windows can be driven by fake time in tests
//! - Worker identity and group key derivation
//! - The bucket assignment wire types exchanged between workers
//! - Worker configuration loading and validation

pub mod bucket;
pub mod clock;
pub mod config;
pub mod identity;

pub use bucket::{Assignment, BucketResponse};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ConfigError, WorkerConfig, DEFAULT_ITERATION_LENGTH, DEFAULT_LEASE_SERVER, MAX_LEASE_LENGTH,
};
pub use identity::{Group, WorkerUri};
