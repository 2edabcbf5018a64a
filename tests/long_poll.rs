//! Integration tests for short polls and long polls against a live store.

use hotswap_poll::core::WaitOutcome;
use hotswap_poll::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_pending, assert_ready, task};

// Allowed overshoot past a deadline.
const SLOP: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_peek_before_and_after_first_update() {
    let latest: LatestValue = LatestValue::default();
    assert!(latest.peek(0).is_none());

    latest.store().update("Update #1".to_string());

    let value = latest.peek(0).unwrap();
    assert_eq!(value.payload, "Update #1");
    assert_eq!(value.version, 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_poll_returns_when_update_arrives() {
    let latest: LatestValue = LatestValue::default();
    latest.store().update("Update #1".to_string());

    let writer = latest.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        writer.store().update("Update #2".to_string());
    });

    let started = Instant::now();
    let value = latest.await_newer(1, Duration::from_millis(5000)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(value.version, 2);
    assert_eq!(value.payload, "Update #2");
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(200) + SLOP);
}

#[tokio::test(start_paused = true)]
async fn test_long_poll_times_out_without_update() {
    let latest: LatestValue = LatestValue::default();
    for i in 1..=5 {
        latest.store().update(format!("Update #{i}"));
    }

    let started = Instant::now();
    let value = latest.await_newer(5, Duration::from_millis(1000)).await;
    let elapsed = started.elapsed();

    assert!(value.is_none());
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1000) + SLOP);
}

#[tokio::test(start_paused = true)]
async fn test_long_poll_does_not_return_early() {
    let latest: LatestValue = LatestValue::default();
    let mut poll = task::spawn(latest.await_newer(0, Duration::from_millis(1000)));
    assert_pending!(poll.poll());

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_pending!(poll.poll());

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(assert_ready!(poll.poll()).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_one_update_wakes_waiters_with_different_baselines() {
    let latest: LatestValue = LatestValue::default();
    for i in 1..=7 {
        latest.store().update(format!("Update #{i}"));
    }

    let mut at_seven = task::spawn(latest.await_newer(7, Duration::from_secs(5)));
    let mut at_three = task::spawn(latest.await_newer(3, Duration::from_secs(5)));
    assert_pending!(at_seven.poll());

    latest.store().update("Update #8".to_string());

    let seven = assert_ready!(at_seven.poll()).unwrap();
    let three = assert_ready!(at_three.poll()).unwrap();
    assert_eq!(seven.version, 8);
    assert_eq!(three.version, 8);
    assert!(Arc::ptr_eq(&seven, &three));
}

#[tokio::test(start_paused = true)]
async fn test_fast_path_when_already_newer() {
    let latest: LatestValue = LatestValue::default();
    latest.store().update("one".to_string());
    latest.store().update("two".to_string());

    assert_eq!(latest.peek(1).unwrap().version, 2);

    let mut poll = task::spawn(latest.await_newer(1, Duration::from_secs(20)));
    let value = assert_ready!(poll.poll()).unwrap();
    assert_eq!(value.payload, "two");
    assert_eq!(latest.store().coordinator().waiting(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_long_poll_releases_waiter() {
    let latest: LatestValue = LatestValue::default();
    let coordinator_store = Arc::clone(latest.store());

    let mut poll = task::spawn(latest.await_newer(0, Duration::from_secs(20)));
    assert_pending!(poll.poll());
    assert_eq!(coordinator_store.coordinator().waiting(), 1);

    drop(poll);
    assert_eq!(coordinator_store.coordinator().waiting(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_aborted_task_releases_waiter() {
    let latest: LatestValue = LatestValue::default();
    let waiter = latest.clone();
    let handle = tokio::spawn(async move { waiter.await_newer(0, Duration::from_secs(20)).await });

    while latest.store().coordinator().waiting() == 0 {
        tokio::task::yield_now().await;
    }

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    assert_eq!(latest.store().coordinator().waiting(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_coordinator_reports_stale_snapshot() {
    let store = VersionedStore::new("only".to_string());
    let outcome = store
        .coordinator()
        .await_version_above(&store, 0, Instant::now() + Duration::from_millis(10))
        .await;

    match outcome {
        WaitOutcome::Stale(snapshot) => assert_eq!(snapshot.payload, "only"),
        WaitOutcome::Fresh(_) => panic!("nothing was published"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_lost_wakeups_under_contention() {
    let latest: LatestValue<u64> = LatestValue::new(0);

    for round in 0..50u64 {
        let waiters: Vec<_> = (0..32)
            .map(|_| {
                let latest = latest.clone();
                tokio::spawn(async move { latest.await_newer(round, Duration::from_secs(10)).await })
            })
            .collect();

        // Publish while waiters are still enrolling.
        tokio::task::yield_now().await;
        let published = latest.store().update(round + 1);

        for waiter in waiters {
            let value = waiter.await.unwrap().expect("waiter missed the update");
            assert!(value.version >= published.version);
        }
    }

    assert_eq!(latest.store().coordinator().waiting(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_consistent_pairs() {
    let latest: LatestValue = LatestValue::new("v0".to_string());
    let target = 500u64;

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let latest = latest.clone();
            tokio::spawn(async move {
                let mut seen = 0;
                while seen < target {
                    if let Some(value) = latest.await_newer(seen, Duration::from_secs(10)).await {
                        assert_eq!(value.payload, format!("v{}", value.version));
                        assert!(value.version > seen);
                        seen = value.version;
                    }
                }
            })
        })
        .collect();

    for v in 1..=target {
        latest.store().update(format!("v{v}"));
        if v % 50 == 0 {
            tokio::task::yield_now().await;
        }
    }

    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_baseline_parsing_feeds_peek() {
    let latest: LatestValue = LatestValue::default();
    latest.store().update("Update #1".to_string());

    // Malformed input behaves like a first-time caller.
    for raw in [None, Some("abc"), Some("-1"), Some("")] {
        let value = latest.peek(parse_baseline(raw)).unwrap();
        assert_eq!(value.version, 1);
    }
    assert!(latest.peek(parse_baseline(Some("1"))).is_none());
}
