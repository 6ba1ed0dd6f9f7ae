// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Static bucket queue worker
//!
//! Every worker of a group runs the same loop: nominate itself for the lease,
//! start the leader duty cycle if it won, then ask whoever leads for a bucket.
//! The leader owns the queue for one iteration and hands each bucket out once.

mod duty;
mod election;
mod error;
mod processor;
mod queue;
mod run;
mod worker;

#[cfg(test)]
mod test_helpers;

pub use duty::TermOutcome;
pub use election::{bucket_hint, MIN_BUCKET_HINT};
pub use error::WorkerError;
pub use processor::{BucketProcessor, ProcessError};
pub use queue::BucketQueue;
pub use run::Exit;
pub use worker::{Worker, WorkerDeps};
