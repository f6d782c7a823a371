//! Persistence for gauges and counters
//!
//! This module stores metrics in a relational database (PostgreSQL or
//! SQLite) and keeps writes safe under transient connectivity faults.
//!
//! ## Design
//!
//! - **Upsert only**: every write is one `INSERT ... ON CONFLICT` statement
//!   keyed by `(name, mtype)`; counters merge additively, gauges overwrite
//! - **Prepared once**: the three metric statements are compiled when the
//!   store (or a transaction) is built and reused afterwards
//! - **Bounded retry**: connectivity faults are retried on a fixed schedule
//!   (`[1s, 3s, 5s]` by default); every other error surfaces immediately
//! - **Degraded start**: an unreachable database does not fail construction;
//!   bootstrap happens on first use instead
//!
//! ## Usage
//!
//! ```no_run
//! use metric_store::config::StorageConfig;
//! use metric_store::storage::Store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Store::connect(&StorageConfig::new("sqlite://./metrics.db?mode=rwc")).await?;
//!     store.add_counter("PollCount", 1).await?;
//!     store.close().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod classify;
pub mod error;
pub mod retry;
pub mod schema;
pub mod statements;
pub mod store;
pub mod tx;

pub use backend::MetricStorage;
pub use classify::{FaultOrigin, RetriableFault, classify};
pub use error::{StorageError, StorageResult};
pub use retry::RetryPolicy;
pub use schema::{MetricKind, MetricRow, MetricUpdate};
pub use store::Store;
pub use tx::Transaction;
