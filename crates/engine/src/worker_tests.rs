// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{secs, Harness, RecordingProcessor};
use sq_adapters::PeerError;
use std::collections::BTreeSet;
use std::time::Duration;

fn uri(s: &str) -> WorkerUri {
    WorkerUri::new(s)
}

#[tokio::test]
async fn non_leader_answers_not_leader_without_touching_its_queue() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(3), RecordingProcessor::default());
    let b = h.worker("b:1", Harness::config(3), RecordingProcessor::default());
    a.nominate().await.unwrap();
    b.state().queue.initialize(3);

    let response = b.bucket_request(&uri("c:1"), None).await.unwrap();

    assert_eq!(response, BucketResponse::not_leader());
    assert_eq!(b.queued_buckets(), 3);
}

#[tokio::test]
async fn leader_hands_out_every_bucket_exactly_once() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(10), RecordingProcessor::default());
    a.nominate().await.unwrap();
    a.state().queue.initialize(10);

    let requesters = [uri("a:1"), uri("b:1"), uri("c:1")];
    let mut handed_out = Vec::new();
    for i in 0..10 {
        let response = a.bucket_request(&requesters[i % 3], None).await.unwrap();
        match response.item {
            Assignment::Bucket(bucket) => handed_out.push(bucket),
            other => panic!("expected a bucket, got {}", other),
        }
    }
    handed_out.sort_unstable();
    assert_eq!(handed_out, (0..10).collect::<Vec<_>>());

    let response = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(response, BucketResponse::new(Assignment::Empty, secs(5)));
}

#[tokio::test]
async fn hint_follows_the_remaining_iteration() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(1), RecordingProcessor::default());
    a.nominate().await.unwrap();

    h.clock.advance(secs(4));
    let response = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(response.hint, secs(3));

    h.clock.advance(Duration::from_millis(5_500));
    let response = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(response.hint, secs(1));
}

#[tokio::test]
async fn stop_is_delivered_once_and_only_after_the_queue_is_empty() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(1), RecordingProcessor::default());
    a.nominate().await.unwrap();
    {
        let mut state = a.state();
        state.queue.initialize(1);
        state
            .queue
            .replace_followers_to_stop(vec![uri("b:1"), uri("c:1")]);
    }

    let first = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(first.item, Assignment::Bucket(0));

    let second = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(second, BucketResponse::stop());

    let third = a.bucket_request(&uri("b:1"), None).await.unwrap();
    assert_eq!(third.item, Assignment::Empty);

    assert_eq!(a.state().queue.followers_to_stop(), vec![uri("c:1")]);
}

#[tokio::test]
async fn leader_never_stops_itself_through_a_bucket_request() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(1), RecordingProcessor::default());
    a.nominate().await.unwrap();
    a.state()
        .queue
        .replace_followers_to_stop(vec![uri("a:1"), uri("b:1")]);

    let response = a.bucket_request(&uri("a:1"), None).await.unwrap();
    assert_eq!(response.item, Assignment::Empty);

    let stopped: BTreeSet<_> = a.state().queue.followers_to_stop().into_iter().collect();
    assert!(stopped.contains(&uri("a:1")));
}

#[tokio::test]
async fn bucket_requests_are_served_to_peers() {
    let h = Harness::new();
    let a = h.worker("a:1", Harness::config(2), RecordingProcessor::default());
    a.nominate().await.unwrap();
    a.state().queue.initialize(2);

    let response = h
        .network
        .bucket_request(&uri("a:1"), &uri("b:1"), None)
        .await
        .unwrap();
    assert!(matches!(response.item, Assignment::Bucket(_)));
    assert_eq!(a.queued_buckets(), 1);
    assert!(h.network.probe_alive(&uri("a:1")).await.unwrap());
}

#[tokio::test]
async fn lease_failures_reach_the_requesting_peer() {
    let h = Harness::new();
    let _a = h.worker("a:1", Harness::config(2), RecordingProcessor::default());
    h.lease.set_unavailable(true);

    let err = h
        .network
        .bucket_request(&uri("a:1"), &uri("b:1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PeerError::Remote { .. }));
}
