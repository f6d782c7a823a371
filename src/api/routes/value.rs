//! Metric read endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{MetricPayload, ValueRequest},
};
use crate::storage::MetricKind;

async fn lookup(state: &ApiState, kind: MetricKind, name: &str) -> ApiResult<MetricPayload> {
    let found = match kind {
        MetricKind::Gauge => state
            .storage
            .get_gauge(name)
            .await?
            .map(|value| MetricPayload::gauge(name, value)),
        MetricKind::Counter => state
            .storage
            .get_counter(name)
            .await?
            .map(|delta| MetricPayload::counter(name, delta)),
    };

    found.ok_or_else(|| ApiError::NotFound(format!("{} '{}' not found", kind, name)))
}

/// GET /value/{type}/{name}
///
/// Returns the bare value as text
pub async fn value_by_uri(
    State(state): State<ApiState>,
    Path((kind, name)): Path<(String, String)>,
) -> ApiResult<String> {
    let kind = kind.parse::<MetricKind>().map_err(ApiError::InvalidRequest)?;
    let metric = lookup(&state, kind, &name).await?;

    Ok(match (metric.delta, metric.value) {
        (Some(delta), _) => delta.to_string(),
        (None, Some(value)) => value.to_string(),
        (None, None) => String::new(),
    })
}

/// POST /value/
pub async fn value_by_body(
    State(state): State<ApiState>,
    request: Result<Json<ValueRequest>, JsonRejection>,
) -> ApiResult<Json<MetricPayload>> {
    let Json(request) = request?;
    Ok(Json(lookup(&state, request.kind, &request.id).await?))
}
