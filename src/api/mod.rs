// HTTP surface.
//
// Thin adapter over the engine: parse query parameters, run a collection,
// serialize the wire schema. Each domain lives in its own submodule.

pub mod graph;
pub mod helpers;
pub mod paths;
pub mod types;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::error::EngineError;
use crate::store::BlockStore;

/// Shared handler state, assembled once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlockStore>,
    /// DFS size cap for the graph endpoint.
    pub graph_size_limit: usize,
    /// See [`crate::dfs::DfsParams::iteration_guard`].
    pub dfs_iteration_guard: bool,
}

pub async fn ping_handler() -> &'static str {
    "pong"
}

pub async fn metrics_handler() -> String {
    crate::metrics::gather_text()
}

/// The full route table, with permissive CORS the frontend relies on.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/metrics", get(metrics_handler))
        .route("/orb/eth/{address}", get(graph::collect_graph_handler))
        .route(
            "/orb/eth/paths/{addressFrom}/to/{addressTo}",
            get(paths::collect_paths_handler),
        )
        .layer(cors)
        .layer(Extension(state))
}

/// Map an engine error to its HTTP shape. Parameter errors are the caller's
/// fault; the enumerator's budget expiry is a gateway timeout; everything
/// else is a 500.
pub(crate) fn engine_error_response(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
