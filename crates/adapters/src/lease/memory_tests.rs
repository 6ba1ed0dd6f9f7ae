// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sq_core::FakeClock;

#[tokio::test]
async fn create_if_absent_only_wins_once() {
    let store = MemoryLeaseStore::new(FakeClock::new());

    assert!(store
        .create_if_absent("g_token", "a:1", Duration::from_secs(10))
        .await
        .unwrap());
    assert!(!store
        .create_if_absent("g_token", "b:1", Duration::from_secs(10))
        .await
        .unwrap());
    assert_eq!(store.get("g_token").await.unwrap().as_deref(), Some("a:1"));
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let clock = FakeClock::new();
    let store = MemoryLeaseStore::new(clock.clone());

    store.set("k", "v", Duration::from_secs(10)).await.unwrap();
    clock.advance(Duration::from_secs(9));
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

    clock.advance(Duration::from_secs(1));
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn expired_entry_can_be_created_again() {
    let clock = FakeClock::new();
    let store = MemoryLeaseStore::new(clock.clone());

    store
        .create_if_absent("k", "first", Duration::from_secs(5))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(6));

    assert!(store
        .create_if_absent("k", "second", Duration::from_secs(5))
        .await
        .unwrap());
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn set_overwrites_and_extends() {
    let clock = FakeClock::new();
    let store = MemoryLeaseStore::new(clock.clone());

    store.set("k", "a", Duration::from_secs(5)).await.unwrap();
    clock.advance(Duration::from_secs(4));
    store.set("k", "b", Duration::from_secs(5)).await.unwrap();
    clock.advance(Duration::from_secs(4));

    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("b"));
}

#[tokio::test]
async fn zero_ttl_never_expires() {
    let clock = FakeClock::new();
    let store = MemoryLeaseStore::new(clock.clone());

    store.set("flag", "1", Duration::ZERO).await.unwrap();
    clock.advance(Duration::from_secs(86_400));
    assert_eq!(store.get("flag").await.unwrap().as_deref(), Some("1"));
}

#[tokio::test]
async fn clones_share_entries() {
    let store = MemoryLeaseStore::new(FakeClock::new());
    let other = store.clone();

    store.set("k", "v", Duration::from_secs(1)).await.unwrap();
    assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));

    other.delete("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn delete_of_absent_key_is_ok() {
    let store = MemoryLeaseStore::new(FakeClock::new());
    store.delete("missing").await.unwrap();
}

#[tokio::test]
async fn ttl_past_the_clock_range_never_expires() {
    let clock = FakeClock::new();
    let store = MemoryLeaseStore::new(clock.clone());

    store.set("g_token", "a:1", Duration::MAX).await.unwrap();
    clock.advance(Duration::from_secs(3600));

    assert_eq!(store.get("g_token").await.unwrap().as_deref(), Some("a:1"));
}
