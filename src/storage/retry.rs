//! Fixed-schedule retry around a single storage operation

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::error::StorageResult;

/// Wait schedule between attempts of one logical operation
///
/// An operation runs at most `schedule.len()` times. After a retriable
/// failure the caller's task sleeps for the entry matching the attempt that
/// just failed; there is no sleep after the final attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<u64>")]
pub struct RetryPolicy {
    schedule: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_secs(&[1, 3, 5])
    }
}

impl From<Vec<u64>> for RetryPolicy {
    fn from(secs: Vec<u64>) -> Self {
        Self::from_secs(&secs)
    }
}

impl RetryPolicy {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule }
    }

    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().copied().map(Duration::from_secs).collect())
    }

    /// Single attempt, never retried
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }

    /// Upper bound on executions of one operation
    pub fn max_attempts(&self) -> usize {
        self.schedule.len().max(1)
    }

    /// Run `attempt` until it succeeds, fails with a non-retriable error, or
    /// the schedule is exhausted. The last observed error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt_no = 0;

        loop {
            attempt_no += 1;

            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retriable() || attempt_no >= max_attempts {
                return Err(err);
            }

            let wait = self.schedule[attempt_no - 1];
            warn!(
                "{} failed (attempt {}/{}): \"{}\". Retrying after {:?}...",
                operation,
                attempt_no,
                max_attempts,
                err.detail(),
                wait
            );
            tokio::time::sleep(wait).await;
        }
    }
}
