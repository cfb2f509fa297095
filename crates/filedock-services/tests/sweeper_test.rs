mod helpers;

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use filedock_core::Batch;
use filedock_services::{AdmissionService, BatchStatus, BatchSweeper};
use helpers::{test_config, InMemoryBatchStore, StaleReadBatchStore};

fn aged_batch(minutes_old: i64) -> Batch {
    let account_id = Uuid::new_v4();
    let started_at = Utc::now() - chrono::Duration::minutes(minutes_old);
    Batch::start(
        account_id,
        Uuid::new_v4(),
        format!("sites/{}/example.com/2026-08-07/1015/", account_id),
        started_at,
    )
}

#[tokio::test]
async fn test_sweep_expires_overdue_active_batches() {
    let store = InMemoryBatchStore::new();
    let overdue = aged_batch(90);
    let fresh = aged_batch(10);
    store.seed(overdue.clone());
    store.seed(fresh.clone());

    let sweeper = BatchSweeper::new(store.clone(), &test_config());
    let outcome = sweeper.sweep().await.unwrap();

    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.expired, 1);
    assert_eq!(outcome.failed, 0);

    let expired = store.get(overdue.id).unwrap();
    assert_eq!(expired.status, BatchStatus::Expired);
    assert!(expired.completed_at.is_some());
    assert_eq!(expired.version, 1);

    // A batch inside the window is untouched.
    assert_eq!(store.get(fresh.id).unwrap().status, BatchStatus::Active);
}

#[tokio::test]
async fn test_sweep_boundary_just_inside_window() {
    let store = InMemoryBatchStore::new();
    let mut config = test_config();
    config.batch_timeout = Duration::from_secs(3600);
    let just_inside = aged_batch(59);
    store.seed(just_inside.clone());

    let sweeper = BatchSweeper::new(store.clone(), &config);
    let outcome = sweeper.sweep().await.unwrap();

    assert_eq!(outcome.examined, 0);
    assert_eq!(store.get(just_inside.id).unwrap().status, BatchStatus::Active);
}

#[tokio::test]
async fn test_sweep_never_expires_terminal_batches() {
    let store = InMemoryBatchStore::new();

    let mut completed = aged_batch(120);
    completed.complete().unwrap();
    let mut failed = aged_batch(120);
    failed.fail().unwrap();
    let mut cancelled = aged_batch(120);
    cancelled.cancel().unwrap();

    for batch in [&completed, &failed, &cancelled] {
        store.seed(batch.clone());
    }

    let sweeper = BatchSweeper::new(store.clone(), &test_config());
    let outcome = sweeper.sweep().await.unwrap();

    assert_eq!(outcome.examined, 0);
    assert_eq!(outcome.expired, 0);
    assert_eq!(store.get(completed.id).unwrap().status, BatchStatus::Completed);
    assert_eq!(store.get(failed.id).unwrap().status, BatchStatus::Failed);
    assert_eq!(store.get(cancelled.id).unwrap().status, BatchStatus::Cancelled);
}

#[tokio::test]
async fn test_version_conflict_is_benign() {
    // The sweeper reads an overdue Active batch, but the client's complete
    // call lands first. The stale save must be swallowed, not surfaced.
    let inner = InMemoryBatchStore::new();
    let batch = aged_batch(90);
    inner.seed(batch.clone());

    // The sweeper will be served this stale Active copy at version 0.
    let store = StaleReadBatchStore::new(inner.clone(), vec![batch.clone()]);

    // Meanwhile the client completes the batch, bumping the version.
    let admission = AdmissionService::new(inner.clone(), &test_config());
    admission.complete_batch(batch.id).await.unwrap();

    let sweeper = BatchSweeper::new(store, &test_config());
    let outcome = sweeper.sweep().await.unwrap();

    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.expired, 0);
    assert_eq!(outcome.already_terminal, 1);
    assert_eq!(outcome.failed, 0);

    // The client's transition stands.
    assert_eq!(inner.get(batch.id).unwrap().status, BatchStatus::Completed);
}

#[tokio::test]
async fn test_sweep_with_nothing_overdue() {
    let store = InMemoryBatchStore::new();
    store.seed(aged_batch(5));

    let sweeper = BatchSweeper::new(store, &test_config());
    let outcome = sweeper.sweep().await.unwrap();
    assert_eq!(outcome.examined, 0);
    assert_eq!(outcome.expired, 0);
}
