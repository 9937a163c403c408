//! Integration tests for reconciliation passes
//!
//! These tests drive `CollectCoordinator` end to end with an in-memory remote
//! store, catalog and settings-backed memory:
//! - Strategy selection (full coverage, direct push, memory, remote probe)
//! - Memory create / append / reset thresholds
//! - Probe failures, cancellation and timeouts leaving memory untouched
//! - Run serialization and the one-shot full-coverage flag

mod common;

use common::*;
use core_collect::{Category, Item, ItemStatus, MemoryAction, Strategy, SyncError};
use core_runtime::events::{CollectEvent, CoreEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Strategy Selection
// ============================================================================

#[tokio::test]
async fn test_small_batch_pushes_without_probe() {
    // Every item already exists remotely; a small batch must not care.
    let remote = FakeRemote::new().with_existing(keys(0..5));
    let h = Harness::new(remote, config().build().unwrap());

    let report = h
        .coordinator
        .reconcile(movies(0..5), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::DirectPush));
    assert_eq!(report.attempted_count(), 5);
    assert_eq!(report.success_count(), 5);
    assert_eq!(h.remote.probe_count(), 0);
    assert!(h.memory().await.is_empty(), "small batch must not create memory");
}

#[tokio::test]
async fn test_small_batch_appends_to_existing_memory() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    h.seed_memory(keys(100..101)).await;

    let report = h
        .coordinator
        .reconcile(movies(0..3), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::DirectPush));
    assert_eq!(report.memory_action, MemoryAction::Appended);
    assert_eq!(h.memory().await.len(), 4);
}

#[tokio::test]
async fn test_memory_filters_known_keys_and_appends() {
    let config = config().small_batch_limit(1).build().unwrap();
    let h = Harness::new(FakeRemote::new(), config);
    h.seed_memory([key(1)].into_iter().collect()).await;

    let report = h
        .coordinator
        .reconcile(vec![movie(1), movie(2)], false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::MemoryFiltered));
    assert_eq!(h.remote.created_ids().await, vec!["2"]);
    assert_eq!(h.remote.probe_count(), 0);
    assert_eq!(h.memory().await, [key(1), key(2)].into_iter().collect());
}

#[tokio::test]
async fn test_remote_probe_filters_large_batch() {
    let remote = FakeRemote::new().with_existing(keys(0..5));
    let h = Harness::new(remote, config().build().unwrap());

    let report = h
        .coordinator
        .reconcile(movies(0..20), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::RemoteFiltered));
    assert_eq!(h.remote.probe_count(), 1);
    assert_eq!(report.attempted_count(), 15);
    assert!(h.remote.created_ids().await.iter().all(|id| id.parse::<usize>().unwrap() >= 5));
    assert_eq!(report.memory_action, MemoryAction::Unchanged);
    assert!(h.memory().await.is_empty());
}

#[tokio::test]
async fn test_remote_filter_matches_across_namespaces() {
    // The remote reports `tmdb:` keys while candidates use another namespace.
    let remote = FakeRemote::new().with_existing(keys(1..2));
    let config = config().namespace("mp").build().unwrap();
    let h = Harness::new(remote, config);

    let report = h
        .coordinator
        .reconcile(movies(1..12), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::RemoteFiltered));
    assert_eq!(report.attempted_count(), 10);
    assert!(!h.remote.created_ids().await.contains(&"1".to_string()));
    assert!(report
        .succeeded_keys()
        .iter()
        .all(|key| key.namespace() == "mp"));
}

#[tokio::test]
async fn test_catalog_answers_are_cached_between_runs() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    let cancel = CancellationToken::new();

    h.coordinator.run(movies(0..3), &cancel).await.unwrap();
    h.coordinator.run(movies(0..3), &cancel).await.unwrap();

    assert_eq!(h.remote.created_ids().await.len(), 6);
    assert_eq!(h.catalog.lookup_count(), 3);
}

// ============================================================================
// Memory Thresholds
// ============================================================================

#[tokio::test]
async fn test_threshold_crossing_creates_memory() {
    let config = config().max_concurrent_pushes(16).build().unwrap();
    let h = Harness::new(FakeRemote::new(), config);

    let report = h
        .coordinator
        .reconcile(movies(0..1200), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::RemoteFiltered));
    assert_eq!(report.success_count(), 1200);
    assert_eq!(report.memory_action, MemoryAction::Saved);
    assert!(h.memory().await.len() >= 1200);
}

#[tokio::test]
async fn test_threshold_not_exceeded_leaves_memory_absent() {
    // 500 already remote + 500 new = 1000, which does not exceed 1000.
    let remote = FakeRemote::new().with_existing(keys(0..500));
    let config = config().max_concurrent_pushes(16).build().unwrap();
    let h = Harness::new(remote, config);

    let report = h
        .coordinator
        .reconcile(movies(0..1000), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.success_count(), 500);
    assert_eq!(report.memory_action, MemoryAction::Unchanged);
    assert!(h.memory().await.is_empty());
}

#[tokio::test]
async fn test_full_coverage_resets_memory_below_threshold() {
    let remote = FakeRemote::new().with_existing(keys(40..60));
    let h = Harness::new(remote, config().build().unwrap());
    h.seed_memory(keys(1000..1003)).await;

    let report = h
        .coordinator
        .reconcile(movies(0..50), true, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(Strategy::FullCoverage));
    // 0..50 incoming plus 50..60 reconstructed from the remote store.
    assert_eq!(report.attempted_count(), 60);
    assert_eq!(report.memory_action, MemoryAction::Reset);
    assert!(h.memory().await.is_empty());
}

#[tokio::test]
async fn test_full_coverage_saves_memory_above_threshold() {
    let remote = FakeRemote::new().with_existing(keys(0..8));
    let h = Harness::new(remote, config().build().unwrap());
    h.seed_memory(keys(1000..1003)).await;

    let report = h
        .coordinator
        .reconcile(movies(5..10), true, 9, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.success_count(), 10);
    assert_eq!(report.memory_action, MemoryAction::Saved);
    assert_eq!(h.memory().await, keys(0..10));
}

#[tokio::test]
async fn test_full_coverage_keeps_incoming_display_fields() {
    let remote = FakeRemote::new().with_existing([key(7)]);
    let h = Harness::new(remote, config().build().unwrap());

    let incoming = movie(7).with_title("Seven").with_year("1995");
    let report = h
        .coordinator
        .reconcile(vec![incoming], true, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempted_count(), 1);
    assert_eq!(report.outcomes[0].item.title.as_deref(), Some("Seven"));
    assert_eq!(report.outcomes[0].item.year.as_deref(), Some("1995"));
}

// ============================================================================
// Pre-filtering
// ============================================================================

#[tokio::test]
async fn test_duplicate_identities_are_pushed_once() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());

    let report = h
        .coordinator
        .reconcile(vec![movie(100), movie(100)], false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempted_count(), 1);
    assert_eq!(h.remote.created_ids().await, vec!["100"]);
}

#[tokio::test]
async fn test_invalid_items_are_not_attempted() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    let no_category = Item {
        external_id: "5".to_string(),
        ..Item::default()
    };

    let report = h
        .coordinator
        .reconcile(
            vec![movie(1), Item::new(Category::Tv, ""), no_category],
            false,
            1000,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.rejected, 2);
    assert_eq!(report.attempted_count(), 1);
}

#[tokio::test]
async fn test_empty_input_is_a_no_op_and_keeps_flag() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    h.coordinator.full_coverage().arm();

    let report = h
        .coordinator
        .run(Vec::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.strategy, None);
    assert_eq!(report.attempted_count(), 0);
    assert_eq!(h.remote.probe_count(), 0);
    assert!(h.coordinator.full_coverage().is_armed());
}

#[tokio::test]
async fn test_catalog_miss_counts_as_failure() {
    let h = Harness::with_catalog(
        FakeRemote::new().rejecting(&["3"]),
        FakeCatalog::missing(&["2"]),
        config().build().unwrap(),
    );

    let report = h
        .coordinator
        .reconcile(movies(1..5), false, 1000, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempted_count(), 4);
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.outcomes[1].status, ItemStatus::LookupMissing);
    assert!(matches!(report.outcomes[2].status, ItemStatus::CreateFailed(_)));
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_probe_failure_aborts_without_pushing() {
    let h = Harness::new(FakeRemote::new().failing_probe(), config().build().unwrap());
    let mut events = h.event_bus.subscribe();

    let result = h
        .coordinator
        .reconcile(movies(0..20), false, 1, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(SyncError::ProbeFailed { .. })));
    assert!(h.remote.created_ids().await.is_empty());
    assert_eq!(h.catalog.lookup_count(), 0);
    assert!(h.memory().await.is_empty());

    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        CoreEvent::Collect(CollectEvent::RunFailed { .. })
    ));
}

#[tokio::test]
async fn test_cancellation_mid_push_leaves_memory_untouched() {
    let cancel = CancellationToken::new();
    let remote = FakeRemote::new().cancel_after(3, cancel.clone());
    let config = config().max_concurrent_pushes(1).small_batch_limit(1).build().unwrap();
    let h = Harness::new(remote, config);
    h.seed_memory(keys(1000..1001)).await;
    let mut events = h.event_bus.subscribe();

    let result = h.coordinator.reconcile(movies(0..10), false, 1000, &cancel).await;

    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert_eq!(h.remote.created_ids().await.len(), 3);
    assert_eq!(h.memory().await, keys(1000..1001));

    let mut saw_cancelled = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Collect(CollectEvent::RunCancelled { items_processed, .. }) = event {
            assert_eq!(items_processed, 3);
            saw_cancelled = true;
        }
    }
    assert!(saw_cancelled);
}

#[tokio::test]
async fn test_cancelled_before_start_does_nothing() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h.coordinator.reconcile(movies(0..20), false, 1000, &cancel).await;

    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert_eq!(h.remote.probe_count(), 0);
    assert!(h.remote.created_ids().await.is_empty());
}

#[tokio::test]
async fn test_timeout_leaves_memory_untouched() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Semaphore::new(0));
    let remote = FakeRemote::new().gated(entered, gate);
    let config = config()
        .run_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let h = Harness::new(remote, config);
    h.seed_memory(keys(1000..1001)).await;

    let result = h
        .coordinator
        .reconcile(movies(0..3), false, 1000, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(SyncError::Timeout(_))));
    assert_eq!(h.memory().await, keys(1000..1001));
}

// ============================================================================
// Serialization and Flags
// ============================================================================

#[tokio::test]
async fn test_try_run_rejects_concurrent_pass() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Semaphore::new(0));
    let remote = FakeRemote::new().gated(entered.clone(), gate.clone());
    let h = Harness::new(remote, config().build().unwrap());

    let coordinator = h.coordinator.clone();
    let running = tokio::spawn(async move {
        coordinator
            .run(vec![movie(1)], &CancellationToken::new())
            .await
    });

    entered.notified().await;
    assert!(h.coordinator.is_running());

    let busy = h
        .coordinator
        .try_run(vec![movie(2)], &CancellationToken::new())
        .await;
    assert!(matches!(busy, Err(SyncError::RunInProgress { .. })));

    gate.add_permits(1);
    let report = running.await.unwrap().unwrap();
    assert_eq!(report.success_count(), 1);
    assert!(!h.coordinator.is_running());
}

#[tokio::test]
async fn test_full_coverage_flag_is_consumed_by_one_run() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    h.coordinator.full_coverage().arm();

    let first = h
        .coordinator
        .run(vec![movie(1)], &CancellationToken::new())
        .await
        .unwrap();
    let second = h
        .coordinator
        .run(vec![movie(2)], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.strategy, Some(Strategy::FullCoverage));
    assert_eq!(second.strategy, Some(Strategy::DirectPush));
    assert_eq!(h.remote.probe_count(), 1);
}

#[tokio::test]
async fn test_full_coverage_on_start_arms_flag() {
    let config = config().full_coverage_on_start(true).build().unwrap();
    let h = Harness::new(FakeRemote::new(), config);

    assert!(h.coordinator.full_coverage().is_armed());
}

#[tokio::test]
async fn test_run_emits_started_and_completed() {
    let h = Harness::new(FakeRemote::new(), config().build().unwrap());
    let mut events = h.event_bus.subscribe();

    h.coordinator
        .run(movies(0..2), &CancellationToken::new())
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        CoreEvent::Collect(CollectEvent::RunStarted {
            strategy,
            candidates,
            ..
        }) => {
            assert_eq!(strategy, "direct_push");
            assert_eq!(candidates, 2);
        }
        other => panic!("unexpected event {:?}", other),
    }

    match events.recv().await.unwrap() {
        CoreEvent::Collect(CollectEvent::RunCompleted {
            attempted,
            succeeded,
            memory_action,
            ..
        }) => {
            assert_eq!(attempted, 2);
            assert_eq!(succeeded, 2);
            assert_eq!(memory_action, "unchanged");
        }
        other => panic!("unexpected event {:?}", other),
    }
}
