//! HTTP API for directive queries

pub mod handlers;
pub mod routes;

pub use handlers::{
    ApiError, AppState, DetectContextRequest, DetectContextResponse, HealthResponse,
    QueryDirectivesRequest, QueryRequestOptions,
};
pub use routes::build_router;
