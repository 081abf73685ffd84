//! Route table for the directive ranking service

use super::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// 1 MiB request body ceiling; task descriptions are short
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/directives/query", post(handlers::query_directives))
        .route("/api/v1/context/detect", post(handlers::detect_context))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
