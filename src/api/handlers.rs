//! API handlers for directive queries and context detection

use crate::directives::{DirectiveFilter, DirectiveStore, Severity};
use crate::metrics::METRICS;
use crate::query::{QueryOptions, QueryOrchestrator, QueryOutcome};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub store: Arc<dyn DirectiveStore>,
    pub started_at: DateTime<Utc>,
}

/// API error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("VALIDATION_ERROR", message)),
    )
}

/// Query request body
#[derive(Debug, Clone, Deserialize)]
pub struct QueryDirectivesRequest {
    pub task_description: String,
    #[serde(default)]
    pub mode_slug: Option<String>,
    #[serde(default)]
    pub options: QueryRequestOptions,
}

/// Per-request options, including the store-level pre-filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequestOptions {
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub token_budget: Option<usize>,
    #[serde(default)]
    pub severity_filter: Option<Vec<Severity>>,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub layer: Option<String>,
}

/// Query directives relevant to a task description
///
/// POST /api/v1/directives/query
pub async fn query_directives(
    State(state): State<AppState>,
    Json(request): Json<QueryDirectivesRequest>,
) -> HandlerResult<QueryOutcome> {
    let started = Instant::now();
    info!(
        "Directive query: {} chars, mode={:?}",
        request.task_description.len(),
        request.mode_slug
    );

    if request.task_description.trim().is_empty() {
        return Err(bad_request("task_description cannot be empty"));
    }
    if request.options.token_budget == Some(0) {
        return Err(bad_request("token_budget must be positive"));
    }
    if request.options.max_items == Some(0) {
        return Err(bad_request("max_items must be positive"));
    }

    let filter = DirectiveFilter {
        workspace: request.options.workspace.clone(),
        layer: request.options.layer.clone(),
        severities: request.options.severity_filter.clone(),
    };

    let candidates = match state.store.fetch(&filter).await {
        Ok(candidates) => candidates,
        Err(e) => {
            error!("Directive fetch failed: {}", e);
            METRICS.record_query(false);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(e.code(), e.to_string())),
            ));
        }
    };

    let options = QueryOptions {
        mode_slug: request.mode_slug,
        max_items: request.options.max_items,
        token_budget: request.options.token_budget,
        severity_filter: request.options.severity_filter,
        ranking_config: None,
    };

    let outcome = state
        .orchestrator
        .query(&request.task_description, candidates, &options)
        .await;

    METRICS
        .request_duration
        .with_label_values(&["query_directives"])
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(outcome))
}

/// Detection request body
#[derive(Debug, Clone, Deserialize)]
pub struct DetectContextRequest {
    pub text: String,
    #[serde(default)]
    pub options: DetectRequestOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectRequestOptions {
    #[serde(default)]
    pub return_keywords: bool,
    /// Confidence below this flags the result as low-confidence
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

/// Detection response
#[derive(Debug, Serialize)]
pub struct DetectContextResponse {
    pub context: crate::detection::TaskContext,
    pub low_confidence: bool,
}

/// Detect task context directly, for diagnostics and testing
///
/// POST /api/v1/context/detect
pub async fn detect_context(
    State(state): State<AppState>,
    Json(request): Json<DetectContextRequest>,
) -> HandlerResult<DetectContextResponse> {
    let started = Instant::now();

    if request.text.trim().is_empty() {
        METRICS.record_detection(false);
        return Err(bad_request("text cannot be empty"));
    }
    if let Some(threshold) = request.options.confidence_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            METRICS.record_detection(false);
            return Err(bad_request("confidence_threshold must be between 0.0 and 1.0"));
        }
    }

    let context = state
        .orchestrator
        .detection()
        .detect_context(
            &request.text,
            crate::detection::DetectOptions {
                return_keywords: request.options.return_keywords,
            },
        )
        .await;

    let low_confidence = request
        .options
        .confidence_threshold
        .map(|threshold| context.confidence < threshold)
        .unwrap_or(false);

    METRICS.record_detection(true);
    METRICS
        .request_duration
        .with_label_values(&["detect_context"])
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(DetectContextResponse {
        context,
        low_confidence,
    }))
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: i64,
    pub directives: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let directives = state.store.len().await.unwrap_or(0);
    Ok(Json(HealthResponse {
        status: "ok",
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        directives,
    }))
}

/// GET /metrics
pub async fn metrics() -> String {
    METRICS.render()
}
