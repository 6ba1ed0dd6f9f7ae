// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP peer channel: one connection per request

use super::protocol::{self, Request, Response, DEFAULT_TIMEOUT};
use super::{PeerChannel, PeerError};
use async_trait::async_trait;
use serde_json::Value;
use sq_core::{BucketResponse, WorkerUri};
use std::time::Duration;
use tokio::net::TcpStream;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for each connect, write and read to a peer
pub fn timeout_peer() -> Duration {
    parse_duration_ms("SQ_TIMEOUT_PEER_MS").unwrap_or(DEFAULT_TIMEOUT)
}

/// Peer channel over TCP
#[derive(Clone, Debug)]
pub struct TcpPeerChannel {
    timeout: Duration,
}

impl TcpPeerChannel {
    pub fn new() -> Self {
        Self {
            timeout: timeout_peer(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn send(&self, peer: &WorkerUri, request: &Request) -> Result<Response, PeerError> {
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(peer.as_str()))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(PeerError::Unreachable {
                    peer: peer.clone(),
                    source,
                })
            }
            Err(_) => return Err(PeerError::Timeout(peer.clone())),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(self.timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| PeerError::Timeout(peer.clone()))??;

        let body = tokio::time::timeout(self.timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| PeerError::Timeout(peer.clone()))??;
        Ok(protocol::decode(&body)?)
    }
}

impl Default for TcpPeerChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerChannel for TcpPeerChannel {
    async fn bucket_request(
        &self,
        peer: &WorkerUri,
        requester: &WorkerUri,
        context: Option<&Value>,
    ) -> Result<BucketResponse, PeerError> {
        let request = Request::BucketRequest {
            requester: requester.clone(),
            context: context.cloned(),
        };
        match self.send(peer, &request).await? {
            Response::Bucket { response } => Ok(response),
            Response::Error { message } => Err(PeerError::Remote {
                peer: peer.clone(),
                message,
            }),
            Response::Alive { .. } => Err(PeerError::UnexpectedResponse(peer.clone())),
        }
    }

    async fn probe_alive(&self, peer: &WorkerUri) -> Result<bool, PeerError> {
        match self.send(peer, &Request::Alive).await? {
            Response::Alive { alive } => Ok(alive),
            Response::Error { message } => Err(PeerError::Remote {
                peer: peer.clone(),
                message,
            }),
            Response::Bucket { .. } => Err(PeerError::UnexpectedResponse(peer.clone())),
        }
    }
}
