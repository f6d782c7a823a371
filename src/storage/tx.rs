//! Transactional counterpart of the store
//!
//! A [`Transaction`] owns one connection borrowed from the pool and its own
//! [`StatementSet`] compiled on that connection. Statements inside a
//! transaction are never retried individually: retrying one statement after
//! the connection dropped would apply half a unit of work. Callers that want
//! retries restart the whole transaction instead (see
//! [`Store::apply_batch`](super::store::Store::apply_batch)).

use sqlx::any::Any;
use tracing::{debug, instrument};

use super::error::StorageResult;
use super::schema::MetricUpdate;
use super::statements::StatementSet;

/// One unit of work on a single borrowed connection
///
/// Dropping an uncommitted transaction rolls it back and returns the
/// connection to the pool.
pub struct Transaction {
    inner: sqlx::Transaction<'static, Any>,
    statements: StatementSet,
}

impl Transaction {
    pub(crate) fn new(inner: sqlx::Transaction<'static, Any>, statements: StatementSet) -> Self {
        Self { inner, statements }
    }

    pub async fn set_gauge(&mut self, name: &str, value: f64) -> StorageResult<()> {
        self.apply(&MetricUpdate::Gauge {
            name: name.to_string(),
            value,
        })
        .await
    }

    pub async fn add_counter(&mut self, name: &str, delta: i64) -> StorageResult<()> {
        self.apply(&MetricUpdate::Counter {
            name: name.to_string(),
            delta,
        })
        .await
    }

    pub async fn get_gauge(&mut self, name: &str) -> StorageResult<Option<f64>> {
        self.statements.gauge(&mut *self.inner, name).await
    }

    pub async fn get_counter(&mut self, name: &str) -> StorageResult<Option<i64>> {
        self.statements.counter(&mut *self.inner, name).await
    }

    /// Apply a single write inside this transaction
    pub async fn apply(&mut self, update: &MetricUpdate) -> StorageResult<()> {
        self.statements.upsert(&mut *self.inner, update).await
    }

    #[instrument(skip_all)]
    pub async fn commit(self) -> StorageResult<()> {
        self.inner.commit().await?;
        debug!("transaction committed");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn rollback(self) -> StorageResult<()> {
        self.inner.rollback().await?;
        debug!("transaction rolled back");
        Ok(())
    }
}
