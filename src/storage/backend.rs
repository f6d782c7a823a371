//! Storage trait consumed by the HTTP layer
//!
//! This module defines the `MetricStorage` trait that request handlers are
//! written against. [`Store`](super::store::Store) is the implementation.

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::{MetricRow, MetricUpdate};
use super::tx::Transaction;

/// Persistent storage for gauges and counters
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between request
/// handlers.
///
/// ## Absence
///
/// Reads of a metric that was never written return `Ok(None)`; absence is
/// not an error.
#[async_trait]
pub trait MetricStorage: Send + Sync {
    /// Replace the value of a gauge
    async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()>;

    /// Add to a counter
    async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()>;

    async fn get_gauge(&self, name: &str) -> StorageResult<Option<f64>>;

    async fn get_counter(&self, name: &str) -> StorageResult<Option<i64>>;

    /// Every stored metric, unordered
    async fn get_all(&self) -> StorageResult<Vec<MetricRow>>;

    /// Apply several writes atomically
    async fn apply_batch(&self, updates: &[MetricUpdate]) -> StorageResult<()>;

    /// Check that the backing database answers
    async fn ping(&self) -> StorageResult<()>;

    /// Start a caller-managed transaction
    async fn begin(&self) -> StorageResult<Transaction>;

    /// Human-readable label for logs
    async fn describe(&self) -> String;

    /// Release connections and prepared statements
    async fn close(&self) -> StorageResult<()>;

    /// Called by the HTTP layer for every inbound request before routing
    ///
    /// Lets a backend contribute to the request pipeline. The default does
    /// nothing.
    fn on_request(&self, _method: &str, _path: &str) {}
}
