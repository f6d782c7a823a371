//! Integration tests for metric semantics
//!
//! These tests verify that:
//! - Counters merge additively and gauges are last-write-wins
//! - A gauge and a counter with the same name never interfere
//! - Unknown metrics read back as absent
//! - Data survives reopening the database

use assert_matches::assert_matches;
use metric_store::storage::{MetricKind, MetricRow, StorageError, Store};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_gauge_round_trip() {
    let (_dir, store) = sqlite_store().await;

    store.set_gauge("temp", 5.5).await.unwrap();

    assert_eq!(store.get_gauge("temp").await.unwrap(), Some(5.5));
}

#[tokio::test]
async fn test_counter_increments_accumulate() {
    let (_dir, store) = sqlite_store().await;

    store.add_counter("hits", 1).await.unwrap();
    store.add_counter("hits", 2).await.unwrap();

    assert_eq!(store.get_counter("hits").await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_negative_counter_delta_is_added() {
    let (_dir, store) = sqlite_store().await;

    store.add_counter("balance", 10).await.unwrap();
    store.add_counter("balance", -4).await.unwrap();

    assert_eq!(store.get_counter("balance").await.unwrap(), Some(6));
}

#[tokio::test]
async fn test_counter_overflow_is_rejected() {
    let (_dir, store) = sqlite_store().await;

    store.add_counter("overflow", i64::MAX).await.unwrap();
    let err = store.add_counter("overflow", 1).await.unwrap_err();

    assert_matches!(err, StorageError::QueryFailed(_));
    assert_eq!(store.get_counter("overflow").await.unwrap(), Some(i64::MAX));
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_gauge_last_write_wins() {
    let (_dir, store) = sqlite_store().await;

    store.set_gauge("load", 0.25).await.unwrap();
    store.set_gauge("load", 0.75).await.unwrap();

    assert_eq!(store.get_gauge("load").await.unwrap(), Some(0.75));
}

#[tokio::test]
async fn test_gauge_and_counter_with_same_name_are_independent() {
    let (_dir, store) = sqlite_store().await;

    store.set_gauge("requests", 42.5).await.unwrap();
    store.add_counter("requests", 7).await.unwrap();
    store.set_gauge("requests", 1.5).await.unwrap();
    store.add_counter("requests", 3).await.unwrap();

    assert_eq!(store.get_gauge("requests").await.unwrap(), Some(1.5));
    assert_eq!(store.get_counter("requests").await.unwrap(), Some(10));
}

#[tokio::test]
async fn test_unknown_metric_is_absent() {
    let (_dir, store) = sqlite_store().await;

    assert_eq!(store.get_gauge("unknown").await.unwrap(), None);
    assert_eq!(store.get_counter("unknown").await.unwrap(), None);
}

#[tokio::test]
async fn test_gauge_does_not_create_counter() {
    let (_dir, store) = sqlite_store().await;

    store.set_gauge("only_gauge", 3.0).await.unwrap();

    assert_eq!(store.get_counter("only_gauge").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_all_returns_one_row_per_name_and_kind() {
    let (_dir, store) = sqlite_store().await;

    store.set_gauge("Alloc", 1024.0).await.unwrap();
    store.add_counter("PollCount", 1).await.unwrap();
    store.add_counter("PollCount", 1).await.unwrap();
    store.set_gauge("PollCount", 9.5).await.unwrap();

    let mut rows = store.get_all().await.unwrap();
    rows.sort_by(|a, b| (&a.name, a.kind.as_str()).cmp(&(&b.name, b.kind.as_str())));

    assert_eq!(
        rows,
        vec![
            MetricRow {
                name: "Alloc".to_string(),
                kind: MetricKind::Gauge,
                delta: 0,
                value: 1024.0,
            },
            MetricRow {
                name: "PollCount".to_string(),
                kind: MetricKind::Counter,
                delta: 2,
                value: 0.0,
            },
            MetricRow {
                name: "PollCount".to_string(),
                kind: MetricKind::Gauge,
                delta: 0,
                value: 9.5,
            },
        ]
    );
}

#[tokio::test]
async fn test_get_all_on_empty_store() {
    let (_dir, store) = sqlite_store().await;

    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_survive_reopening() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&temp_dir.path().join("persist.db"));

    let store = Store::connect(&config).await.unwrap();
    store.add_counter("restarts", 1).await.unwrap();
    store.set_gauge("uptime", 12.0).await.unwrap();
    store.close().await.unwrap();

    // schema creation is idempotent, so reconnecting must keep existing rows
    let reopened = Store::connect(&config).await.unwrap();
    reopened.add_counter("restarts", 1).await.unwrap();

    assert_eq!(reopened.get_counter("restarts").await.unwrap(), Some(2));
    assert_eq!(reopened.get_gauge("uptime").await.unwrap(), Some(12.0));
}
