//! Retriability of database errors
//!
//! Only faults that plausibly heal on their own are retried: the network
//! dropping out from under a connection, or the engine reporting that the
//! connection itself is gone. Everything else (constraint violations,
//! malformed queries, decode errors) is a logic problem and is surfaced to
//! the caller on the first attempt.

use std::fmt;

/// SQLSTATE codes outside class `08` that still mean "this connection is gone"
const CONNECTION_LOSS_CODES: [&str; 3] = [
    "57P01", // admin_shutdown
    "57P02", // crash_shutdown
    "57P03", // cannot_connect_now
];

/// Where a retriable fault was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOrigin {
    /// I/O, TLS or pool-level failure below the SQL layer
    Transport,

    /// The engine reported a connection exception
    Engine { code: String },
}

/// A database error judged worth retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriableFault {
    pub origin: FaultOrigin,
    pub message: String,
}

impl fmt::Display for RetriableFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            FaultOrigin::Transport => write!(f, "transport: {}", self.message),
            FaultOrigin::Engine { code } => write!(f, "engine [{}]: {}", code, self.message),
        }
    }
}

/// Classify a database error
///
/// Returns `Some` with the fault detail when the error is retriable and
/// `None` when it must be surfaced immediately.
pub fn classify(err: &sqlx::Error) -> Option<RetriableFault> {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::WorkerCrashed => Some(RetriableFault {
            origin: FaultOrigin::Transport,
            message: err.to_string(),
        }),
        sqlx::Error::Database(db_err) => {
            let code = db_err.code()?;
            if !is_connection_exception(&code) {
                return None;
            }

            Some(RetriableFault {
                origin: FaultOrigin::Engine {
                    code: code.into_owned(),
                },
                message: db_err.message().to_string(),
            })
        }
        _ => None,
    }
}

/// Whether a SQLSTATE code reports a lost or refused connection
pub fn is_connection_exception(code: &str) -> bool {
    code.starts_with("08") || CONNECTION_LOSS_CODES.contains(&code)
}
