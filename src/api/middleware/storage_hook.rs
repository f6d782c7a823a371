//! Request hook for the storage backend

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::state::ApiState;

/// Hand every request to the storage backend before routing it
pub async fn storage_hook(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    state
        .storage
        .on_request(request.method().as_str(), request.uri().path());

    next.run(request).await
}
