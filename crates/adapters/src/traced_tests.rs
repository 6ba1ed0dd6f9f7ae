// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lease::{FakeLeaseStore, LeaseCall};
use crate::peer::{FakePeerNetwork, HandlerError, PeerCall, PeerHandler};
use sq_core::{Assignment, FakeClock};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

struct EmptyHandler;

#[async_trait]
impl PeerHandler for EmptyHandler {
    async fn bucket_request(
        &self,
        _requester: &WorkerUri,
        _context: Option<&Value>,
    ) -> Result<BucketResponse, HandlerError> {
        Ok(BucketResponse::new(Assignment::Empty, Duration::from_secs(4)))
    }
}

// =============================================================================
// Precondition validation tests
// =============================================================================

#[tokio::test]
async fn traced_lease_rejects_empty_key_without_calling_inner() {
    let fake = FakeLeaseStore::new(FakeClock::new());
    let traced = TracedLeaseStore::new(fake.clone());

    let ttl = Duration::from_secs(1);
    let errors = [
        traced.create_if_absent("", "v", ttl).await.unwrap_err(),
        traced.set("", "v", ttl).await.unwrap_err(),
        traced.get("").await.unwrap_err(),
        traced.delete("").await.unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, LeaseError::InvalidKey(_)), "{}", err);
    }
    assert!(fake.calls().is_empty());
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_lease_add_logs_span_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedLeaseStore::new(FakeLeaseStore::new(FakeClock::new()));
        traced
            .create_if_absent("jobs_token", "10.0.0.1:7001", Duration::from_secs(5))
            .await
    });

    assert!(result.unwrap());
    assert!(logs.contains("lease.add"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("jobs_token"), "Should log key. Logs:\n{}", logs);
    assert!(logs.contains("elapsed_ms"), "Should log timing. Logs:\n{}", logs);
}

#[test]
fn traced_lease_logs_failures() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeLeaseStore::new(FakeClock::new());
        fake.set_unavailable(true);
        TracedLeaseStore::new(fake)
            .set("jobs_token", "x", Duration::from_secs(5))
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("set failed"), "Should log failure. Logs:\n{}", logs);
}

#[test]
fn traced_peer_logs_assignment() {
    let (logs, result) = with_tracing(|| async {
        let network = FakePeerNetwork::new();
        let leader = WorkerUri::new("10.0.0.1:7001");
        network.register(leader.clone(), Arc::new(EmptyHandler));

        TracedPeerChannel::new(network)
            .bucket_request(&leader, &WorkerUri::new("10.0.0.2:7001"), None)
            .await
    });

    assert_eq!(result.unwrap().item, Assignment::Empty);
    assert!(
        logs.contains("peer.bucket_request"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("10.0.0.1:7001"), "Should log peer. Logs:\n{}", logs);
    assert!(logs.contains("assigned"), "Should log completion. Logs:\n{}", logs);
}

#[test]
fn traced_peer_logs_unreachable() {
    let (logs, result) = with_tracing(|| async {
        TracedPeerChannel::new(FakePeerNetwork::new())
            .bucket_request(&WorkerUri::new("gone:1"), &WorkerUri::new("me:1"), None)
            .await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("bucket request failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_lease_delegates_to_inner() {
    let fake = FakeLeaseStore::new(FakeClock::new());
    let traced = TracedLeaseStore::new(fake.clone());

    traced.set("k", "v", Duration::from_secs(2)).await.unwrap();
    assert_eq!(traced.get("k").await.unwrap().as_deref(), Some("v"));
    traced.delete("k").await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            LeaseCall::Set {
                key: "k".into(),
                value: "v".into(),
                ttl: Duration::from_secs(2),
            },
            LeaseCall::Get { key: "k".into() },
            LeaseCall::Delete { key: "k".into() },
        ]
    );
}

#[tokio::test]
async fn traced_peer_delegates_probe_to_inner() {
    let network = FakePeerNetwork::new();
    let peer = WorkerUri::new("a:1");
    network.register(peer.clone(), Arc::new(EmptyHandler));

    assert!(TracedPeerChannel::new(network.clone())
        .probe_alive(&peer)
        .await
        .unwrap());
    assert_eq!(network.calls(), vec![PeerCall::ProbeAlive { peer }]);
}
