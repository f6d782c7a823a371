//! Integration tests for concurrent access
//!
//! These tests verify that concurrent writers through one shared store lose
//! no counter increments and never mix up metrics.

use std::sync::Arc;

use futures::future::join_all;
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_counter_increments_are_not_lost() {
    let (_dir, store) = sqlite_store().await;
    let store = Arc::new(store);

    let tasks = (0..20).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..5 {
                store.add_counter("hits", 1).await.unwrap();
            }
        })
    });

    for result in join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(store.get_counter("hits").await.unwrap(), Some(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_on_distinct_metrics() {
    let (_dir, store) = sqlite_store().await;
    let store = Arc::new(store);

    let tasks = (0..10).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            let name = format!("gauge_{i}");
            store.set_gauge(&name, i as f64).await.unwrap();
            store.add_counter(&name, i).await.unwrap();
        })
    });

    for result in join_all(tasks).await {
        result.unwrap();
    }

    for i in 0..10 {
        let name = format!("gauge_{i}");
        assert_eq!(store.get_gauge(&name).await.unwrap(), Some(i as f64));
        assert_eq!(store.get_counter(&name).await.unwrap(), Some(i));
    }
    assert_eq!(store.get_all().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_concurrent_reads_share_statements() {
    let (_dir, store) = sqlite_store().await;
    store.set_gauge("shared", 7.25).await.unwrap();

    let reads = (0..16).map(|_| store.get_gauge("shared"));

    for value in join_all(reads).await {
        assert_eq!(value.unwrap(), Some(7.25));
    }
}
