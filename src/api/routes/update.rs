//! Metric write endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::debug;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::MetricPayload,
};
use crate::storage::{MetricKind, MetricUpdate};

/// POST /update/{type}/{name}/{value}
pub async fn update_by_uri(
    State(state): State<ApiState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let kind = kind.parse::<MetricKind>().map_err(ApiError::InvalidRequest)?;

    match kind {
        MetricKind::Gauge => {
            let value = value
                .parse::<f64>()
                .map_err(|e| ApiError::InvalidRequest(format!("invalid gauge value: {e}")))?;
            if !value.is_finite() {
                return Err(ApiError::InvalidRequest(format!(
                    "gauge value must be finite, got {value}"
                )));
            }
            state.storage.set_gauge(&name, value).await?;
        }
        MetricKind::Counter => {
            let delta = value
                .parse::<i64>()
                .map_err(|e| ApiError::InvalidRequest(format!("invalid counter delta: {e}")))?;
            state.storage.add_counter(&name, delta).await?;
        }
    }

    Ok(StatusCode::OK)
}

/// POST /update/
///
/// Stores one metric and answers with its value after the write
pub async fn update_by_body(
    State(state): State<ApiState>,
    payload: Result<Json<MetricPayload>, JsonRejection>,
) -> ApiResult<Json<MetricPayload>> {
    let Json(payload) = payload?;

    let stored = match payload.into_update()? {
        MetricUpdate::Gauge { name, value } => {
            state.storage.set_gauge(&name, value).await?;
            let current = state.storage.get_gauge(&name).await?.unwrap_or(value);
            MetricPayload::gauge(name, current)
        }
        MetricUpdate::Counter { name, delta } => {
            state.storage.add_counter(&name, delta).await?;
            let current = state.storage.get_counter(&name).await?.unwrap_or(delta);
            MetricPayload::counter(name, current)
        }
    };

    Ok(Json(stored))
}

/// POST /updates/
///
/// Applies a list of metrics atomically
pub async fn update_batch(
    State(state): State<ApiState>,
    payload: Result<Json<Vec<MetricPayload>>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(payloads) = payload?;

    let updates = payloads
        .into_iter()
        .map(MetricPayload::into_update)
        .collect::<ApiResult<Vec<_>>>()?;

    debug!("applying batch of {} metrics", updates.len());
    state.storage.apply_batch(&updates).await?;

    Ok(StatusCode::OK)
}
