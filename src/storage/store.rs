//! Relational metric store
//!
//! This module provides the [`Store`], the non-transactional façade over a
//! connection pool and its prepared statements.
//!
//! ## Construction
//!
//! [`Store::connect`] builds a lazy pool and, within a 10 second budget:
//! 1. pings the database,
//! 2. creates the `metrics` table if it is missing,
//! 3. prepares the statement set.
//!
//! If the ping fails the store is still returned. Steps 2 and 3 then run on
//! the first operation instead, so a server can start before its database is
//! reachable and heal once it is.
//!
//! ## Retries
//!
//! Every metric read and write is wrapped in the configured [`RetryPolicy`].
//! `ping`, `begin` and `close` are not retried.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::backend::MetricStorage;
use super::error::{BootstrapStage, StorageError, StorageResult};
use super::retry::RetryPolicy;
use super::schema::{Dialect, MetricKind, MetricRow, MetricUpdate, ensure_schema};
use super::statements::StatementSet;
use super::tx::Transaction;
use crate::config::StorageConfig;

/// Overall budget for ping, schema creation and statement preparation
const CONSTRUCTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget for preparing a transaction's statement set
const TX_PREPARE_TIMEOUT: Duration = Duration::from_secs(3);

/// Budget for the diagnostic database-name lookup
const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(1);

const INVALID_DATABASE_NAME: &str = "(Error: Invalid database name)";

/// Metric store backed by PostgreSQL or SQLite
///
/// Safe to share between tasks; the pool and the prepared statements may be
/// used concurrently.
pub struct Store {
    pool: AnyPool,
    dialect: Dialect,
    retry: RetryPolicy,
    statements: OnceCell<StatementSet>,
}

impl Store {
    /// Connect to the database described by `config`
    ///
    /// Fails only on an invalid configuration, or when the database is
    /// reachable but the schema or statements cannot be set up.
    #[instrument(skip_all)]
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        sqlx::any::install_default_drivers();

        let dialect = Dialect::from_url(&config.dsn)?;
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_lazy(&config.dsn)
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        info!("initializing {:?} metric store", dialect);

        let store = Self {
            pool,
            dialect,
            retry: config.retry.clone(),
            statements: OnceCell::new(),
        };

        let deadline = Instant::now() + CONSTRUCTION_TIMEOUT;

        match tokio::time::timeout_at(deadline, store.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("failed to reach database to create tables and prepare queries: {}", e);
                return Ok(store);
            }
            Err(_) => {
                error!(
                    "database did not answer within {:?}, delaying bootstrap to first use",
                    CONSTRUCTION_TIMEOUT
                );
                return Ok(store);
            }
        }

        let statements = tokio::time::timeout_at(deadline, store.bootstrap())
            .await
            .map_err(|_| StorageError::Timeout {
                stage: BootstrapStage::Prepare,
                after: CONSTRUCTION_TIMEOUT,
            })??;

        // nothing else can have initialized the cell before we return the store
        let _ = store.statements.set(statements);

        info!("metric store ready");
        Ok(store)
    }

    /// Create the schema and compile the statement set on a pooled connection
    async fn bootstrap(&self) -> StorageResult<StatementSet> {
        let mut conn = self.pool.acquire().await?;

        ensure_schema(&mut conn, self.dialect).await?;
        debug!("the metrics table was created, if it did not exist");

        let statements = StatementSet::prepare(&mut conn).await?;
        debug!("SQL statements are prepared");

        Ok(statements)
    }

    /// Prepared statements, bootstrapping first if construction skipped it
    async fn statements(&self) -> StorageResult<&StatementSet> {
        self.statements
            .get_or_try_init(|| async {
                warn!("metric store was not bootstrapped at startup, bootstrapping now");
                self.bootstrap().await
            })
            .await
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn write(&self, operation: &str, update: MetricUpdate) -> StorageResult<()> {
        self.retry
            .run(operation, || async {
                let statements = self.statements().await?;
                statements.upsert(&self.pool, &update).await
            })
            .await
    }

    /// Upsert a gauge, replacing any previous value
    #[instrument(skip(self))]
    pub async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()> {
        let update = MetricUpdate::Gauge {
            name: name.to_string(),
            value,
        };
        self.write(&format!("set gauge metric {}", name), update).await
    }

    /// Add `delta` to a counter, creating it at `delta` if missing
    #[instrument(skip(self))]
    pub async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()> {
        let update = MetricUpdate::Counter {
            name: name.to_string(),
            delta,
        };
        self.write(&format!("add counter metric {}", name), update).await
    }

    /// Current gauge value, `None` if the gauge was never written
    #[instrument(skip(self))]
    pub async fn get_gauge(&self, name: &str) -> StorageResult<Option<f64>> {
        self.retry
            .run(&format!("get gauge metric {}", name), || async {
                let statements = self.statements().await?;
                statements.gauge(&self.pool, name).await
            })
            .await
    }

    /// Accumulated counter value, `None` if the counter was never written
    #[instrument(skip(self))]
    pub async fn get_counter(&self, name: &str) -> StorageResult<Option<i64>> {
        self.retry
            .run(&format!("get counter metric {}", name), || async {
                let statements = self.statements().await?;
                statements.counter(&self.pool, name).await
            })
            .await
    }

    /// Every stored metric, in no particular order
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> StorageResult<Vec<MetricRow>> {
        self.retry
            .run("get all metrics", || async {
                self.statements().await?;

                let rows = sqlx::query("SELECT name, mtype, delta, value FROM metrics")
                    .fetch_all(&self.pool)
                    .await?;

                rows.into_iter()
                    .map(|row| -> StorageResult<MetricRow> {
                        let mtype: String = row.try_get("mtype")?;
                        let kind = mtype.parse::<MetricKind>().map_err(StorageError::InvalidRow)?;

                        Ok(MetricRow {
                            name: row.try_get("name")?,
                            kind,
                            delta: row.try_get("delta")?,
                            value: row.try_get("value")?,
                        })
                    })
                    .collect::<StorageResult<Vec<_>>>()
            })
            .await
    }

    /// Apply `updates` atomically
    ///
    /// The whole transaction is the unit of retry: a connectivity fault drops
    /// (and so rolls back) the current attempt and starts a new transaction.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn apply_batch(&self, updates: &[MetricUpdate]) -> StorageResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        self.retry
            .run("apply metric batch", || async {
                let mut tx = self.begin().await?;
                for update in updates {
                    tx.apply(update).await?;
                }
                tx.commit().await
            })
            .await
    }

    /// Liveness probe, not retried
    pub async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::Connection::ping(&mut *conn).await?;
        Ok(())
    }

    /// Start a transaction on a connection borrowed from the pool
    #[instrument(skip(self))]
    pub async fn begin(&self) -> StorageResult<Transaction> {
        // the statements below need the table, which a degraded store has not created yet
        self.statements().await?;

        let mut inner = self.pool.begin().await?;

        let statements = tokio::time::timeout(TX_PREPARE_TIMEOUT, StatementSet::prepare(&mut inner))
            .await
            .map_err(|_| StorageError::Timeout {
                stage: BootstrapStage::Prepare,
                after: TX_PREPARE_TIMEOUT,
            })??;

        debug!("a new transaction has been created");
        Ok(Transaction::new(inner, statements))
    }

    /// Diagnostic label naming the connected database
    ///
    /// Never fails; an unreachable database yields a placeholder name.
    pub async fn describe(&self) -> String {
        let lookup = sqlx::query_scalar::<_, String>(self.dialect.current_database_sql())
            .fetch_one(&self.pool);

        let name = match tokio::time::timeout(DESCRIBE_TIMEOUT, lookup).await {
            Ok(Ok(name)) if !name.is_empty() => name,
            _ => INVALID_DATABASE_NAME.to_string(),
        };

        format!("MetricStore - {}", name)
    }

    /// Release every pooled connection
    ///
    /// The statement set stays in place but becomes inert: the compiled
    /// statements live in each connection's cache and are deallocated with
    /// it, and any later use fails because the pool is closed.
    pub async fn close(&self) -> StorageResult<()> {
        info!("closing metric store");
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait]
impl MetricStorage for Store {
    async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()> {
        Store::set_gauge(self, name, value).await
    }

    async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()> {
        Store::add_counter(self, name, delta).await
    }

    async fn get_gauge(&self, name: &str) -> StorageResult<Option<f64>> {
        Store::get_gauge(self, name).await
    }

    async fn get_counter(&self, name: &str) -> StorageResult<Option<i64>> {
        Store::get_counter(self, name).await
    }

    async fn get_all(&self) -> StorageResult<Vec<MetricRow>> {
        Store::get_all(self).await
    }

    async fn apply_batch(&self, updates: &[MetricUpdate]) -> StorageResult<()> {
        Store::apply_batch(self, updates).await
    }

    async fn ping(&self) -> StorageResult<()> {
        Store::ping(self).await
    }

    async fn begin(&self) -> StorageResult<Transaction> {
        Store::begin(self).await
    }

    async fn describe(&self) -> String {
        Store::describe(self).await
    }

    async fn close(&self) -> StorageResult<()> {
        Store::close(self).await
    }
}
