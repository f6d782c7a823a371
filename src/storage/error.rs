//! Error types for storage operations

use std::fmt;
use std::time::Duration;

use super::classify::{RetriableFault, classify};

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stage of store construction that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// `CREATE TABLE IF NOT EXISTS metrics`
    Schema,

    /// Compiling the prepared statement set
    Prepare,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStage::Schema => write!(f, "schema creation"),
            BootstrapStage::Prepare => write!(f, "statement preparation"),
        }
    }
}

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Transport or engine-reported connection fault. Worth retrying; surfaced
    /// once the retry schedule is exhausted.
    Connectivity {
        fault: RetriableFault,
        source: sqlx::Error,
    },

    /// Query, constraint or decode failure. Never retried.
    QueryFailed(sqlx::Error),

    /// Schema creation or statement compilation failed
    Bootstrap {
        stage: BootstrapStage,
        source: sqlx::Error,
    },

    /// A bounded construction step ran out of time
    Timeout {
        stage: BootstrapStage,
        after: Duration,
    },

    /// Invalid configuration
    InvalidConfig(String),

    /// A stored row could not be mapped back to a metric
    InvalidRow(String),
}

impl StorageError {
    /// Whether the retry policy should attempt the operation again
    pub fn is_retriable(&self) -> bool {
        match self {
            StorageError::Connectivity { .. } => true,
            // a degraded store bootstraps lazily, so a bootstrap that lost its
            // connection is as transient as any other attempt
            StorageError::Bootstrap { source, .. } => classify(source).is_some(),
            StorageError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Short description of the fault, used in retry logs
    pub fn detail(&self) -> String {
        match self {
            StorageError::Connectivity { fault, .. } => fault.to_string(),
            other => other.to_string(),
        }
    }

    pub(crate) fn bootstrap(stage: BootstrapStage) -> impl FnOnce(sqlx::Error) -> StorageError {
        move |source| StorageError::Bootstrap { stage, source }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Connectivity { fault, .. } => {
                write!(f, "lost connection to database: {}", fault)
            }
            StorageError::QueryFailed(err) => write!(f, "storage query failed: {}", err),
            StorageError::Bootstrap { stage, source } => {
                write!(f, "storage bootstrap failed during {}: {}", stage, source)
            }
            StorageError::Timeout { stage, after } => {
                write!(f, "{} did not finish within {:?}", stage, after)
            }
            StorageError::InvalidConfig(msg) => write!(f, "invalid storage configuration: {}", msg),
            StorageError::InvalidRow(msg) => write!(f, "invalid metric row: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Connectivity { source, .. } => Some(source),
            StorageError::QueryFailed(err) => Some(err),
            StorageError::Bootstrap { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match classify(&err) {
            Some(fault) => StorageError::Connectivity { fault, source: err },
            None => StorageError::QueryFailed(err),
        }
    }
}
