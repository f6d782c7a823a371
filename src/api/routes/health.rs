//! Database liveness endpoint

use axum::{extract::State, http::StatusCode};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /ping
///
/// 200 when the database answers, 500 otherwise
pub async fn ping(State(state): State<ApiState>) -> ApiResult<StatusCode> {
    state.storage.ping().await?;
    Ok(StatusCode::OK)
}
