//! The three prepared statements every store and transaction holds

use sqlx::any::{Any, AnyStatement};
use sqlx::{AnyConnection, Executor, Row, Statement};
use tracing::debug;

use super::error::{BootstrapStage, StorageError, StorageResult};
use super::schema::MetricUpdate;

const GET_GAUGE_SQL: &str = "SELECT value FROM metrics WHERE name = $1 AND mtype = 'gauge'";

const GET_COUNTER_SQL: &str = "SELECT delta FROM metrics WHERE name = $1 AND mtype = 'counter'";

// Gauges bind delta = 0, which leaves the accumulated delta untouched;
// counters bind value = 0.0, which is never read back for a counter.
const UPSERT_SQL: &str = r#"
    INSERT INTO metrics (name, mtype, delta, value)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (name, mtype) DO UPDATE SET
        delta = metrics.delta + excluded.delta,
        value = excluded.value
"#;

/// Compiled statements bound to one owner (the store, or a transaction)
pub struct StatementSet {
    pub get_gauge: AnyStatement<'static>,
    pub get_counter: AnyStatement<'static>,
    pub upsert: AnyStatement<'static>,
}

impl StatementSet {
    /// Compile all three statements on `conn`
    ///
    /// Failing to compile any of them is fatal to the owner being built.
    pub async fn prepare(conn: &mut AnyConnection) -> StorageResult<Self> {
        let get_gauge = Self::compile(conn, GET_GAUGE_SQL).await?;
        let get_counter = Self::compile(conn, GET_COUNTER_SQL).await?;
        let upsert = Self::compile(conn, UPSERT_SQL).await?;

        debug!("prepared metric statements");
        Ok(Self {
            get_gauge,
            get_counter,
            upsert,
        })
    }

    async fn compile(
        conn: &mut AnyConnection,
        sql: &'static str,
    ) -> StorageResult<AnyStatement<'static>> {
        (&mut *conn)
            .prepare(sql)
            .await
            .map_err(StorageError::bootstrap(BootstrapStage::Prepare))
    }

    /// Execute the upsert for one write on `executor`
    pub async fn upsert<'c, E>(&self, executor: E, update: &MetricUpdate) -> StorageResult<()>
    where
        E: Executor<'c, Database = Any>,
    {
        let (delta, value) = update.upsert_columns();

        self.upsert
            .query()
            .bind(update.name().to_owned())
            .bind(update.kind().as_str())
            .bind(delta)
            .bind(value)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn gauge<'c, E>(&self, executor: E, name: &str) -> StorageResult<Option<f64>>
    where
        E: Executor<'c, Database = Any>,
    {
        let row = self
            .get_gauge
            .query()
            .bind(name.to_owned())
            .fetch_optional(executor)
            .await?;

        Ok(row.map(|row| row.try_get::<f64, _>(0)).transpose()?)
    }

    pub async fn counter<'c, E>(&self, executor: E, name: &str) -> StorageResult<Option<i64>>
    where
        E: Executor<'c, Database = Any>,
    {
        let row = self
            .get_counter
            .query()
            .bind(name.to_owned())
            .fetch_optional(executor)
            .await?;

        Ok(row.map(|row| row.try_get::<i64, _>(0)).transpose()?)
    }
}
