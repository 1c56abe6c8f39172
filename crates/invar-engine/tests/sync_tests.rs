//! Sync cycle and scheduler behavior against mock sources.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{build_service, machine, MockSource};
use invar_connector::SourceRegistry;
use invar_core::types::{SourceType, SyncRunStatus, ALLOWED_SYNC_INTERVALS};
use invar_core::SyncError;
use invar_engine::{InventoryStore, MemoryStore, SyncService};

#[tokio::test]
async fn update_schedule_accepts_allowed_intervals() {
    let (service, _, _, _) = build_service();

    for minutes in ALLOWED_SYNC_INTERVALS {
        let schedule = service
            .update_schedule(SourceType::Azure, false, Some(minutes))
            .await
            .unwrap();
        assert_eq!(schedule.interval_minutes, minutes);
    }
}

#[tokio::test]
async fn update_schedule_rejects_other_intervals() {
    let (service, _, _, _) = build_service();

    for minutes in [1, 10, 45, 61, 359, 720, 10_000] {
        let err = service
            .update_schedule(SourceType::Azure, false, Some(minutes))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SyncError::Validation { .. }),
            "interval {minutes} should be rejected, got {err}"
        );
    }
}

#[tokio::test]
async fn successful_sync_updates_schedule_records_and_count() {
    let (service, azure, _, store) = build_service();
    azure.set_records(vec![
        machine(SourceType::Azure, "vm-1", "web-01"),
        machine(SourceType::Azure, "vm-2", "db-01"),
    ]);

    let outcome = service.trigger_sync(SourceType::Azure).await.unwrap();
    assert_eq!(outcome.status, SyncRunStatus::Success);
    assert_eq!(outcome.records_synced, Some(2));
    assert!(outcome.error.is_none());
    // Schedule is disabled by default, so no next run is due.
    assert!(outcome.next_sync_at.is_none());

    let schedule = service.get_schedule(SourceType::Azure).await.unwrap();
    assert_eq!(schedule.last_sync_status, Some(SyncRunStatus::Success));
    assert!(schedule.last_sync_at.is_some());
    assert_eq!(schedule.last_sync_count, Some(2));
    assert!(schedule.last_sync_duration_ms.is_some());

    let records = store.list_records(SourceType::Azure).await.unwrap();
    assert_eq!(records.len(), 2);

    // Machine count refreshed without a probe.
    let health = service.get_all_health().await.unwrap();
    let azure_health = health
        .iter()
        .find(|h| h.source_type == SourceType::Azure)
        .unwrap();
    assert_eq!(azure_health.machine_count, Some(2));
}

#[tokio::test]
async fn failed_fetch_is_captured_and_next_sync_still_computed() {
    let (service, azure, _, _) = build_service();
    azure.set_fail_fetch(true);

    service
        .update_schedule(SourceType::Azure, true, Some(60))
        .await
        .unwrap();

    let outcome = service.trigger_sync(SourceType::Azure).await.unwrap();
    assert_eq!(outcome.status, SyncRunStatus::Failed);
    assert!(outcome.error.as_deref().unwrap().contains("mock fetch failure"));
    // Still enabled, so the next run stays scheduled.
    assert!(outcome.next_sync_at.is_some());

    let schedule = service.get_schedule(SourceType::Azure).await.unwrap();
    assert_eq!(schedule.last_sync_status, Some(SyncRunStatus::Failed));
    assert!(!schedule.last_sync_error.as_deref().unwrap().is_empty());
    assert!(schedule.next_sync_at.unwrap() > schedule.last_sync_at.unwrap());

    service.shutdown().await;
}

#[tokio::test]
async fn status_is_never_left_running() {
    let (service, azure, _, _) = build_service();

    service.trigger_sync(SourceType::Azure).await.unwrap();
    let schedule = service.get_schedule(SourceType::Azure).await.unwrap();
    assert_ne!(schedule.last_sync_status, Some(SyncRunStatus::Running));

    azure.set_fail_fetch(true);
    service.trigger_sync(SourceType::Azure).await.unwrap();
    let schedule = service.get_schedule(SourceType::Azure).await.unwrap();
    assert_ne!(schedule.last_sync_status, Some(SyncRunStatus::Running));
}

#[tokio::test(start_paused = true)]
async fn concurrent_trigger_is_rejected_without_second_fetch() {
    let (service, azure, _, _) = build_service();
    azure.set_fetch_delay(Duration::from_secs(5));

    let first = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.trigger_sync(SourceType::Azure).await })
    };

    // Let the first cycle reach its fetch before racing it.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let err = service.trigger_sync(SourceType::Azure).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::ConcurrentSync {
            source_type: SourceType::Azure
        }
    ));
    assert_eq!(azure.fetch_calls(), 1);

    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.status, SyncRunStatus::Success);

    // The slot is free again once the first cycle finished.
    service.trigger_sync(SourceType::Azure).await.unwrap();
    assert_eq!(azure.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn timer_fires_on_interval_and_disable_cancels_it() {
    let (service, azure, _, _) = build_service();
    azure.set_records(vec![machine(SourceType::Azure, "vm-1", "web-01")]);

    service
        .update_schedule(SourceType::Azure, true, Some(15))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15 * 60 + 5)).await;
    assert_eq!(azure.fetch_calls(), 1);

    tokio::time::sleep(Duration::from_secs(15 * 60)).await;
    assert_eq!(azure.fetch_calls(), 2);

    let schedule = service
        .update_schedule(SourceType::Azure, false, None)
        .await
        .unwrap();
    assert!(schedule.next_sync_at.is_none());

    // Well past several would-be intervals: the timer stays quiet.
    tokio::time::sleep(Duration::from_secs(4 * 3600)).await;
    assert_eq!(azure.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reenabling_restarts_the_timer_at_the_new_interval() {
    let (service, azure, _, _) = build_service();

    service
        .update_schedule(SourceType::Azure, true, Some(1440))
        .await
        .unwrap();

    // Switching to a shorter interval replaces the old timer.
    service
        .update_schedule(SourceType::Azure, true, Some(15))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(16 * 60)).await;
    assert_eq!(azure.fetch_calls(), 1);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn initialize_on_startup_starts_only_enabled_timers() {
    let azure = Arc::new(MockSource::new(SourceType::Azure));
    let legacy = Arc::new(MockSource::new(SourceType::Legacy));
    let mut sources = SourceRegistry::new();
    sources.register(azure.clone());
    sources.register(legacy.clone());

    // A schedule enabled in a previous process lifetime.
    let store = Arc::new(MemoryStore::new());
    let mut schedule = invar_core::types::SyncSchedule::with_defaults(SourceType::Azure);
    schedule.enabled = true;
    schedule.interval_minutes = 15;
    store.put_schedule(&schedule).await.unwrap();

    let service = SyncService::new(store, sources);
    service.initialize_on_startup().await.unwrap();

    tokio::time::sleep(Duration::from_secs(16 * 60)).await;
    assert_eq!(azure.fetch_calls(), 1);
    assert_eq!(legacy.fetch_calls(), 0);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_every_timer() {
    let (service, azure, legacy, _) = build_service();

    service
        .update_schedule(SourceType::Azure, true, Some(15))
        .await
        .unwrap();
    service
        .update_schedule(SourceType::Legacy, true, Some(15))
        .await
        .unwrap();

    service.shutdown().await;

    tokio::time::sleep(Duration::from_secs(4 * 3600)).await;
    assert_eq!(azure.fetch_calls(), 0);
    assert_eq!(legacy.fetch_calls(), 0);
}

#[tokio::test]
async fn trigger_sync_for_unregistered_source_fails() {
    let azure = Arc::new(MockSource::new(SourceType::Azure));
    let mut sources = SourceRegistry::new();
    sources.register(azure);

    let service = SyncService::new(Arc::new(MemoryStore::new()), sources);

    let err = service.trigger_sync(SourceType::Legacy).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::SourceNotRegistered {
            source_type: SourceType::Legacy
        }
    ));
}

#[tokio::test]
async fn sources_sync_independently() {
    let (service, azure, legacy, _) = build_service();
    azure.set_fail_fetch(true);
    legacy.set_records(vec![machine(SourceType::Legacy, "l-1", "web-01")]);

    // Azure failing does not block the legacy cycle.
    let azure_outcome = service.trigger_sync(SourceType::Azure).await.unwrap();
    assert_eq!(azure_outcome.status, SyncRunStatus::Failed);

    let legacy_outcome = service.trigger_sync(SourceType::Legacy).await.unwrap();
    assert_eq!(legacy_outcome.status, SyncRunStatus::Success);
    assert_eq!(legacy_outcome.records_synced, Some(1));
}
