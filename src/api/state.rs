//! Shared state for API handlers

use std::sync::Arc;

use crate::storage::MetricStorage;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Metric storage backend
    pub storage: Arc<dyn MetricStorage>,
}

impl ApiState {
    pub fn new(storage: Arc<dyn MetricStorage>) -> Self {
        Self { storage }
    }
}
