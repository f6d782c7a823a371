#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod storage;

pub use storage::{MetricKind, MetricRow, MetricStorage, MetricUpdate, Store};
