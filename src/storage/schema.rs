//! Database schema and metric row definitions
//!
//! ## Layout
//!
//! All metrics live in a single `metrics` relation, one row per
//! `(name, mtype)` pair:
//!
//! | column  | meaning                                          |
//! |---------|--------------------------------------------------|
//! | `_id`   | surrogate primary key                            |
//! | `name`  | metric name                                      |
//! | `mtype` | `"gauge"` or `"counter"`                         |
//! | `delta` | accumulated counter value (gauges keep `0`)      |
//! | `value` | last gauge value (counters keep `0.0`)           |
//!
//! The `UNIQUE (name, mtype)` constraint is the only thing that keeps a name
//! from having two rows of the same kind. Writes never read first; they
//! upsert and let the constraint route them to the existing row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::AnyConnection;
use tracing::debug;

use super::error::{BootstrapStage, StorageError, StorageResult};

/// Kind of metric, stored in the `mtype` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Last-write-wins floating point value
    Gauge,

    /// Additively accumulating integer
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(format!("unknown metric type '{}'", other)),
        }
    }
}

/// A single row of the `metrics` relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub name: String,
    pub kind: MetricKind,
    /// Only meaningful for counters
    pub delta: i64,
    /// Only meaningful for gauges
    pub value: f64,
}

/// A single write, as accepted by transactions and batches
#[derive(Debug, Clone, PartialEq)]
pub enum MetricUpdate {
    Gauge { name: String, value: f64 },
    Counter { name: String, delta: i64 },
}

impl MetricUpdate {
    pub fn name(&self) -> &str {
        match self {
            MetricUpdate::Gauge { name, .. } | MetricUpdate::Counter { name, .. } => name,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricUpdate::Gauge { .. } => MetricKind::Gauge,
            MetricUpdate::Counter { .. } => MetricKind::Counter,
        }
    }

    /// `(delta, value)` as bound to the upsert statement
    ///
    /// Gauges bind a zero delta so the additive merge leaves `delta` alone;
    /// counters bind a zero value.
    pub(crate) fn upsert_columns(&self) -> (i64, f64) {
        match self {
            MetricUpdate::Gauge { value, .. } => (0, *value),
            MetricUpdate::Counter { delta, .. } => (*delta, 0.0),
        }
    }
}

/// SQL flavour of the configured database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a connection URL's scheme
    pub fn from_url(url: &str) -> StorageResult<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            Err(StorageError::InvalidConfig(format!(
                "unsupported database url '{}', expected postgres:// or sqlite:",
                url
            )))
        }
    }

    /// Idempotent DDL for the `metrics` relation
    pub fn create_table_sql(&self) -> &'static str {
        match self {
            Dialect::Postgres => {
                r#"
                CREATE TABLE IF NOT EXISTS metrics (
                    "_id" SERIAL,
                    "name" TEXT NOT NULL,
                    "mtype" VARCHAR(12) NOT NULL DEFAULT 'gauge',
                    "delta" BIGINT NOT NULL DEFAULT 0,
                    "value" DOUBLE PRECISION NOT NULL DEFAULT 0.0,
                    CONSTRAINT metrics_name_mtype_key UNIQUE (name, mtype),
                    PRIMARY KEY (_id)
                )
                "#
            }
            Dialect::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS metrics (
                    _id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    mtype TEXT NOT NULL DEFAULT 'gauge',
                    delta INTEGER NOT NULL DEFAULT 0 CHECK (typeof(delta) = 'integer'),
                    value REAL NOT NULL DEFAULT 0.0,
                    CONSTRAINT metrics_name_mtype_key UNIQUE (name, mtype)
                )
                "#
            }
        }
    }

    /// Query returning the name of the database the pool is connected to
    pub fn current_database_sql(&self) -> &'static str {
        match self {
            Dialect::Postgres => "SELECT current_database()::text",
            Dialect::Sqlite => "SELECT file FROM pragma_database_list WHERE name = 'main'",
        }
    }
}

/// Create the `metrics` relation if it does not exist yet
pub async fn ensure_schema(conn: &mut AnyConnection, dialect: Dialect) -> StorageResult<()> {
    sqlx::query(dialect.create_table_sql())
        .execute(&mut *conn)
        .await
        .map_err(StorageError::bootstrap(BootstrapStage::Schema))?;

    debug!("metrics table is present");
    Ok(())
}
