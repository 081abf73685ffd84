//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry, Counter, CounterVec,
    Histogram, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Query pipeline metrics
    pub directive_queries: CounterVec,
    pub context_detections: CounterVec,
    pub request_duration: HistogramVec,

    // Detection metrics
    pub detection_fallbacks: Counter,
    pub provider_failures: CounterVec,

    // Budget metrics
    pub tokens_selected: Histogram,
    pub budget_remaining: Histogram,
    pub directives_returned: Histogram,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        // Query pipeline metrics
        let directive_queries = register_counter_vec_with_registry!(
            Opts::new("directive_queries_total", "Total directive query requests"),
            &["status"],
            registry
        )?;

        let context_detections = register_counter_vec_with_registry!(
            Opts::new("context_detections_total", "Total context detection requests"),
            &["status"],
            registry
        )?;

        let request_duration = register_histogram_vec_with_registry!(
            "request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            registry
        )?;

        // Detection metrics
        let detection_fallbacks = register_counter_with_registry!(
            Opts::new(
                "detection_fallbacks_total",
                "Detections answered by the rule-based fallback"
            ),
            registry
        )?;

        let provider_failures = register_counter_vec_with_registry!(
            Opts::new("provider_failures_total", "Model provider failures"),
            &["provider"],
            registry
        )?;

        // Budget metrics
        let tokens_selected = register_histogram_with_registry!(
            "tokens_selected",
            "Estimated tokens of the budgeted selection",
            registry
        )?;

        let budget_remaining = register_histogram_with_registry!(
            "budget_remaining",
            "Tokens left unspent per query",
            registry
        )?;

        let directives_returned = register_histogram_with_registry!(
            "directives_returned",
            "Directives included in the selection per query",
            registry
        )?;

        Ok(Self {
            registry,
            directive_queries,
            context_detections,
            request_duration,
            detection_fallbacks,
            provider_failures,
            tokens_selected,
            budget_remaining,
            directives_returned,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a directive query request
    pub fn record_query(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.directive_queries.with_label_values(&[status]).inc();
    }

    /// Record a context detection request
    pub fn record_detection(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.context_detections.with_label_values(&[status]).inc();
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .unwrap_or_default()
    }
}
