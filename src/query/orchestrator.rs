//! Query orchestration
//!
//! The externally visible entry point: composes context detection,
//! scoring, mode adjustment, severity grouping, and budget allocation into
//! one pass, and assembles the diagnostics callers use to explain results.

use crate::budget::TokenBudgetAllocator;
use crate::detection::{ContextDetectionEngine, DetectOptions, TaskContext};
use crate::directives::{Directive, Severity};
use crate::metrics::METRICS;
use crate::ranking::{RankingConfig, RankingEngine, RankingMode, ScoredDirective};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Per-call query options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Re-ranking mode slug; unknown slugs are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_slug: Option<String>,
    /// Cap on directives handed to the allocator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Token budget for the selection; falls back to the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<usize>,
    /// Keep only these severities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_filter: Option<Vec<Severity>>,
    /// Per-call ranking config override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_config: Option<RankingConfig>,
}

/// Defaults applied when a query leaves options unset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_token_budget")]
    pub default_token_budget: usize,
    #[serde(default = "default_max_items")]
    pub default_max_items: usize,
}

fn default_token_budget() -> usize {
    2000
}
fn default_max_items() -> usize {
    50
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_token_budget: default_token_budget(),
            default_max_items: default_max_items(),
        }
    }
}

/// Timing and coverage diagnostics for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDiagnostics {
    pub query_time_ms: u64,
    pub context_detection_time_ms: u64,
    pub ranking_time_ms: u64,
    pub total_directives: usize,
    pub returned_directives: usize,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
    pub fallback_used: bool,
}

/// Result of one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Budgeted selection, MUST first, then SHOULD, then MAY
    pub selected: Vec<ScoredDirective>,
    pub context: TaskContext,
    pub diagnostics: QueryDiagnostics,
    pub total_tokens: usize,
    pub budget_remaining: usize,
}

/// Detection → scoring → ranking → budget pipeline
///
/// Stateless across queries; the shared pieces (config, vocabulary) are
/// read-only after construction.
pub struct QueryOrchestrator {
    detection: Arc<ContextDetectionEngine>,
    ranking: RankingEngine,
    allocator: TokenBudgetAllocator,
    config: QueryConfig,
}

impl QueryOrchestrator {
    pub fn new(
        detection: Arc<ContextDetectionEngine>,
        ranking: RankingEngine,
        allocator: TokenBudgetAllocator,
        config: QueryConfig,
    ) -> Self {
        Self {
            detection,
            ranking,
            allocator,
            config,
        }
    }

    /// Run the full pipeline over a candidate pool
    ///
    /// Never fails: an empty pool or zero matches yields an empty selection
    /// with valid diagnostics.
    pub async fn query(
        &self,
        task_text: &str,
        candidates: Vec<Directive>,
        options: &QueryOptions,
    ) -> QueryOutcome {
        let query_id = Uuid::new_v4();
        let started = Instant::now();
        let total_directives = candidates.len();

        debug!(
            "Query {}: {} candidates, mode={:?}",
            query_id, total_directives, options.mode_slug
        );

        // Keywords feed the semantic-similarity and when-to-apply factors
        let context = self
            .detection
            .detect_context(
                task_text,
                DetectOptions {
                    return_keywords: true,
                },
            )
            .await;
        let detection_time_ms = context.diagnostics.detection_time_ms;

        let ranking_started = Instant::now();
        let scored = self.ranking.score_directives(
            &candidates,
            &context,
            options.ranking_config.as_ref(),
        );

        let mode = options
            .mode_slug
            .as_deref()
            .and_then(RankingMode::from_slug);
        let mut adjusted = self.ranking.apply_mode_adjustments(scored, mode);

        if let Some(ref severities) = options.severity_filter {
            adjusted.retain(|s| severities.contains(&s.directive.severity));
        }

        let mut flattened = self.ranking.group_by_severity(adjusted).flatten();
        let max_items = options.max_items.unwrap_or(self.config.default_max_items);
        flattened.truncate(max_items);
        let ranking_time_ms = ranking_started.elapsed().as_millis() as u64;

        let budget = options
            .token_budget
            .unwrap_or(self.config.default_token_budget);
        let allocation = self.allocator.allocate_budget_by_severity(flattened, budget);

        let diagnostics = QueryDiagnostics {
            query_time_ms: started.elapsed().as_millis() as u64,
            context_detection_time_ms: detection_time_ms,
            ranking_time_ms,
            total_directives,
            returned_directives: allocation.items_included,
            confidence: context.confidence,
            model_provider: context.diagnostics.model_provider.clone(),
            fallback_used: context.diagnostics.fallback_used,
        };

        METRICS.record_query(true);
        METRICS.tokens_selected.observe(allocation.total_tokens as f64);
        METRICS
            .budget_remaining
            .observe(allocation.budget_remaining as f64);
        METRICS
            .directives_returned
            .observe(allocation.items_included as f64);

        info!(
            "Query {}: returned {}/{} directives, {} tokens of {} budget, layer={}",
            query_id,
            allocation.items_included,
            total_directives,
            allocation.total_tokens,
            budget,
            context.layer
        );

        QueryOutcome {
            selected: allocation.selected,
            context,
            diagnostics,
            total_tokens: allocation.total_tokens,
            budget_remaining: allocation.budget_remaining,
        }
    }

    pub fn detection(&self) -> &Arc<ContextDetectionEngine> {
        &self.detection
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::provider::test_support::FailingProvider;
    use crate::detection::{DetectionEngineConfig, RuleBasedDetector, Vocabulary};
    use crate::ranking::TokenEstimationConfig;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn directive(id: &str, severity: Severity, topics: &[&str], text: &str) -> Directive {
        Directive {
            id: id.to_string(),
            rule_id: "rules/test.md".to_string(),
            section: "Section".to_string(),
            severity,
            text: text.to_string(),
            rationale: None,
            example: None,
            anti_pattern: None,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            layers: BTreeSet::new(),
            technologies: BTreeSet::new(),
            when_to_apply: vec![],
        }
    }

    fn orchestrator() -> QueryOrchestrator {
        orchestrator_with_providers(vec![])
    }

    fn orchestrator_with_providers(
        providers: Vec<Arc<dyn crate::detection::ModelProvider>>,
    ) -> QueryOrchestrator {
        let vocabulary = Arc::new(Vocabulary::builtin());
        let detection = Arc::new(ContextDetectionEngine::new(
            providers,
            RuleBasedDetector::new(Vocabulary::builtin()),
            DetectionEngineConfig {
                provider_timeout: Duration::from_millis(100),
                cache: None,
            },
        ));
        let config = Arc::new(RankingConfig::default());
        QueryOrchestrator::new(
            detection,
            RankingEngine::new(vocabulary, config.clone()),
            TokenBudgetAllocator::char_based(&TokenEstimationConfig::default()),
            QueryConfig::default(),
        )
    }

    fn pool() -> Vec<Directive> {
        vec![
            directive("style", Severity::May, &["coding-standards"], "Prefer descriptive names"),
            directive("auth", Severity::Must, &["security"], "Authenticate all api requests"),
            directive("log", Severity::Should, &["logging"], "Log request failures with context"),
        ]
    }

    #[tokio::test]
    async fn test_query_orders_by_severity_groups() {
        let outcome = orchestrator()
            .query(
                "Secure the api endpoint authentication",
                pool(),
                &QueryOptions::default(),
            )
            .await;

        assert_eq!(outcome.diagnostics.total_directives, 3);
        let severities: Vec<Severity> = outcome
            .selected
            .iter()
            .map(|s| s.directive.severity)
            .collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
    }

    #[tokio::test]
    async fn test_empty_pool_yields_empty_selection_with_diagnostics() {
        let outcome = orchestrator()
            .query("anything at all", vec![], &QueryOptions::default())
            .await;

        assert!(outcome.selected.is_empty());
        assert_eq!(outcome.diagnostics.total_directives, 0);
        assert_eq!(outcome.diagnostics.returned_directives, 0);
        assert!(outcome.diagnostics.confidence > 0.0);
    }

    #[tokio::test]
    async fn test_severity_filter_is_applied() {
        let outcome = orchestrator()
            .query(
                "Secure the api endpoint",
                pool(),
                &QueryOptions {
                    severity_filter: Some(vec![Severity::Must]),
                    ..Default::default()
                },
            )
            .await;

        assert!(outcome
            .selected
            .iter()
            .all(|s| s.directive.severity == Severity::Must));
        assert_eq!(outcome.selected.len(), 1);
    }

    #[tokio::test]
    async fn test_max_items_caps_selection() {
        let outcome = orchestrator()
            .query(
                "Secure the api endpoint",
                pool(),
                &QueryOptions {
                    max_items: Some(1),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(outcome.selected.len(), 1);
        // Highest-priority severity survives the cap
        assert_eq!(outcome.selected[0].directive.severity, Severity::Must);
    }

    #[tokio::test]
    async fn test_token_budget_limits_selection() {
        let candidates: Vec<Directive> = (0..8)
            .map(|i| {
                directive(
                    &format!("d-{}", i),
                    Severity::Must,
                    &["security"],
                    &"x".repeat(168),
                )
            })
            .collect();

        let outcome = orchestrator()
            .query(
                "security review",
                candidates,
                &QueryOptions {
                    token_budget: Some(300),
                    ..Default::default()
                },
            )
            .await;

        assert!(outcome.selected.len() < 8);
        assert!(outcome.total_tokens <= 300);
        assert_eq!(outcome.budget_remaining, 300 - outcome.total_tokens);
    }

    #[tokio::test]
    async fn test_mode_slug_reranks() {
        let candidates = vec![
            directive("arch", Severity::Should, &["architecture"], "Design the module boundary"),
            directive("test", Severity::Should, &["testing"], "Write integration tests"),
        ];

        let outcome = orchestrator()
            .query(
                "Plan the architecture design for the service",
                candidates,
                &QueryOptions {
                    mode_slug: Some("architect".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(outcome.selected[0].directive.id, "arch");
    }

    #[tokio::test]
    async fn test_all_providers_failing_sets_fallback_diagnostics() {
        let orchestrator = orchestrator_with_providers(vec![
            Arc::new(FailingProvider::new("primary")),
            Arc::new(FailingProvider::new("secondary")),
        ]);

        let outcome = orchestrator
            .query("Secure the api", pool(), &QueryOptions::default())
            .await;

        assert!(outcome.diagnostics.fallback_used);
        assert!(outcome.diagnostics.model_provider.is_none());
    }

    #[tokio::test]
    async fn test_unknown_mode_slug_is_ignored() {
        let outcome_plain = orchestrator()
            .query("Secure the api", pool(), &QueryOptions::default())
            .await;
        let outcome_unknown = orchestrator()
            .query(
                "Secure the api",
                pool(),
                &QueryOptions {
                    mode_slug: Some("refactor".to_string()),
                    ..Default::default()
                },
            )
            .await;

        let ids = |o: &QueryOutcome| -> Vec<String> {
            o.selected.iter().map(|s| s.directive.id.clone()).collect()
        };
        assert_eq!(ids(&outcome_plain), ids(&outcome_unknown));
    }
}
