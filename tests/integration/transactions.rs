//! Integration tests for transactions and batches
//!
//! These tests verify that:
//! - Writes inside a transaction are visible to it but not to the store
//!   until commit
//! - Rollback and drop both discard uncommitted writes
//! - Batches land all together

use assert_matches::assert_matches;
use metric_store::storage::{MetricUpdate, StorageError};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_commit_publishes_writes() {
    let (_dir, store) = sqlite_store().await;

    let mut tx = store.begin().await.unwrap();
    tx.set_gauge("temp", 21.5).await.unwrap();
    tx.add_counter("hits", 4).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(store.get_gauge("temp").await.unwrap(), Some(21.5));
    assert_eq!(store.get_counter("hits").await.unwrap(), Some(4));
}

#[tokio::test]
async fn test_transaction_reads_its_own_writes() {
    let (_dir, store) = sqlite_store().await;
    store.add_counter("hits", 10).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.add_counter("hits", 5).await.unwrap();
    tx.set_gauge("temp", 3.0).await.unwrap();

    assert_eq!(tx.get_counter("hits").await.unwrap(), Some(15));
    assert_eq!(tx.get_gauge("temp").await.unwrap(), Some(3.0));
    assert_eq!(tx.get_gauge("missing").await.unwrap(), None);

    tx.commit().await.unwrap();
}

#[tokio::test]
async fn test_uncommitted_writes_are_invisible_to_the_store() {
    let (_dir, store) = sqlite_store().await;

    let mut tx = store.begin().await.unwrap();
    tx.add_counter("pending", 1).await.unwrap();

    assert_eq!(store.get_counter("pending").await.unwrap(), None);

    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_rollback_discards_writes() {
    let (_dir, store) = sqlite_store().await;
    store.set_gauge("temp", 1.0).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.set_gauge("temp", 99.0).await.unwrap();
    tx.add_counter("hits", 7).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(store.get_gauge("temp").await.unwrap(), Some(1.0));
    assert_eq!(store.get_counter("hits").await.unwrap(), None);
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let (_dir, store) = sqlite_store().await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.add_counter("abandoned", 3).await.unwrap();
    }

    assert_eq!(store.get_counter("abandoned").await.unwrap(), None);

    // the connection went back to the pool in a usable state
    store.add_counter("abandoned", 1).await.unwrap();
    assert_eq!(store.get_counter("abandoned").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_apply_batch_writes_everything() {
    let (_dir, store) = sqlite_store().await;

    let batch = vec![
        MetricUpdate::Counter {
            name: "PollCount".to_string(),
            delta: 1,
        },
        MetricUpdate::Gauge {
            name: "Alloc".to_string(),
            value: 512.0,
        },
        MetricUpdate::Counter {
            name: "PollCount".to_string(),
            delta: 2,
        },
        MetricUpdate::Gauge {
            name: "Alloc".to_string(),
            value: 1024.0,
        },
    ];

    store.apply_batch(&batch).await.unwrap();

    assert_eq!(store.get_counter("PollCount").await.unwrap(), Some(3));
    assert_eq!(store.get_gauge("Alloc").await.unwrap(), Some(1024.0));
}

#[tokio::test]
async fn test_batch_rejected_midway_writes_nothing() {
    let (_dir, store) = sqlite_store().await;

    // SQLite stores NaN as NULL, which the NOT NULL constraint rejects
    let batch = vec![
        MetricUpdate::Counter {
            name: "hits".to_string(),
            delta: 1,
        },
        MetricUpdate::Gauge {
            name: "bad".to_string(),
            value: f64::NAN,
        },
    ];

    let err = store.apply_batch(&batch).await.unwrap_err();

    assert_matches!(err, StorageError::QueryFailed(_));
    assert_eq!(store.get_counter("hits").await.unwrap(), None);
    assert_eq!(store.get_gauge("bad").await.unwrap(), None);
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let (_dir, store) = sqlite_store().await;

    store.apply_batch(&[]).await.unwrap();

    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sequential_transactions_accumulate() {
    let (_dir, store) = sqlite_store().await;

    for _ in 0..3 {
        let mut tx = store.begin().await.unwrap();
        tx.add_counter("ticks", 2).await.unwrap();
        tx.commit().await.unwrap();
    }

    assert_eq!(store.get_counter("ticks").await.unwrap(), Some(6));
}
