//! Metric listing endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::MetricPayload};

/// GET /
///
/// Returns every stored metric
pub async fn list_metrics(State(state): State<ApiState>) -> ApiResult<Json<Vec<MetricPayload>>> {
    let rows = state.storage.get_all().await?;
    Ok(Json(rows.into_iter().map(MetricPayload::from).collect()))
}
