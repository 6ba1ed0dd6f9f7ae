// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-to-worker messaging
//!
//! Every worker serves two requests to its peers: a liveness probe and a
//! bucket request. [`PeerHandler`] is the serving side, [`PeerChannel`] the
//! calling side.

pub mod protocol;
mod server;
mod tcp;

pub use protocol::ProtocolError;
pub use server::PeerServer;
pub use tcp::{timeout_peer, TcpPeerChannel};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePeerNetwork, PeerCall};

use async_trait::async_trait;
use serde_json::Value;
use sq_core::{BucketResponse, WorkerUri};
use thiserror::Error;

/// Error a handler reports back to the requesting peer
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from calling a peer
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {peer} unreachable: {source}")]
    Unreachable {
        peer: WorkerUri,
        #[source]
        source: std::io::Error,
    },
    #[error("peer {0} timed out")]
    Timeout(WorkerUri),
    #[error("peer protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("peer {peer} failed: {message}")]
    Remote { peer: WorkerUri, message: String },
    #[error("unexpected response from peer {0}")]
    UnexpectedResponse(WorkerUri),
}

/// Serving side of the peer endpoint
#[async_trait]
pub trait PeerHandler: Send + Sync + 'static {
    /// Answer a bucket request from `requester`
    async fn bucket_request(
        &self,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, HandlerError>;

    /// Answer a liveness probe
    fn alive(&self) -> bool {
        true
    }
}

/// Calling side of the peer endpoint
#[async_trait]
pub trait PeerChannel: Clone + Send + Sync + 'static {
    /// Ask `peer` for a bucket on behalf of `requester`
    async fn bucket_request(
        &self,
        peer: &WorkerUri,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, PeerError>;

    /// Probe whether `peer` is serving
    async fn probe_alive(&self, peer: &WorkerUri) -> Result<bool, PeerError>;
}
