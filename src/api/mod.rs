//! HTTP API for pushing and reading metrics
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **`MetricStorage`** trait object as the only handler dependency
//! - Every request passes the storage backend's request hook before routing
//!
//! ## Endpoints
//!
//! - `GET /` - All metrics
//! - `GET /ping` - Database liveness
//! - `POST /update/{type}/{name}/{value}` - Store one metric from the path
//! - `POST /update/` - Store one metric from a JSON body
//! - `POST /updates/` - Store a JSON list of metrics atomically
//! - `GET /value/{type}/{name}` - Read one metric as text
//! - `POST /value/` - Read one metric as JSON

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{MetricPayload, ValueRequest};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: crate::config::get_default_address(),
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(routes::metrics::list_metrics))
        .route("/ping", get(routes::health::ping))
        .route("/update/", post(routes::update::update_by_body))
        .route(
            "/update/:kind/:name/:value",
            post(routes::update::update_by_uri),
        )
        .route("/updates/", post(routes::update::update_batch))
        .route("/value/", post(routes::value::value_by_body))
        .route("/value/:kind/:name", get(routes::value::value_by_uri))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::storage_hook::storage_hook,
                )),
        )
        .with_state(state)
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
