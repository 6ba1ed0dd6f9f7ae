// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the collaborators a worker talks to: the lease store, its
//! peers, and the service directory

pub mod directory;
pub mod lease;
pub mod peer;
pub mod traced;

pub use directory::{Directory, DirectoryError, StaticDirectory};
pub use lease::{LeaseError, LeaseStore, MemcacheLeaseStore, MemoryLeaseStore};
pub use peer::{
    HandlerError, PeerChannel, PeerError, PeerHandler, PeerServer, ProtocolError,
    TcpPeerChannel,
};
pub use traced::{TracedLeaseStore, TracedPeerChannel};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use lease::{FakeLeaseStore, LeaseCall};
#[cfg(any(test, feature = "test-support"))]
pub use peer::{FakePeerNetwork, PeerCall};
