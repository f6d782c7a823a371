//! API request and response types

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::storage::{MetricKind, MetricRow, MetricUpdate};

/// A metric as exchanged over JSON
///
/// Counters carry `delta`, gauges carry `value`; the other field is omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: MetricKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl MetricPayload {
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge,
            delta: None,
            value: Some(value),
        }
    }

    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        }
    }

    /// Validate the payload into a storage write
    pub fn into_update(self) -> ApiResult<MetricUpdate> {
        if self.id.is_empty() {
            return Err(ApiError::InvalidRequest("metric id must not be empty".to_string()));
        }

        match (self.kind, self.delta, self.value) {
            (MetricKind::Gauge, _, Some(value)) if !value.is_finite() => Err(
                ApiError::InvalidRequest(format!("gauge '{}' value must be finite", self.id)),
            ),
            (MetricKind::Gauge, _, Some(value)) => Ok(MetricUpdate::Gauge {
                name: self.id,
                value,
            }),
            (MetricKind::Counter, Some(delta), _) => Ok(MetricUpdate::Counter {
                name: self.id,
                delta,
            }),
            (MetricKind::Gauge, _, None) => Err(ApiError::InvalidRequest(format!(
                "gauge '{}' is missing a value",
                self.id
            ))),
            (MetricKind::Counter, None, _) => Err(ApiError::InvalidRequest(format!(
                "counter '{}' is missing a delta",
                self.id
            ))),
        }
    }
}

impl From<MetricRow> for MetricPayload {
    fn from(row: MetricRow) -> Self {
        match row.kind {
            MetricKind::Gauge => MetricPayload::gauge(row.name, row.value),
            MetricKind::Counter => MetricPayload::counter(row.name, row.delta),
        }
    }
}

/// Body of `POST /value/`
#[derive(Debug, Clone, Deserialize)]
pub struct ValueRequest {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: MetricKind,
}
