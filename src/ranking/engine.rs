//! Ranking engine
//!
//! Scores a candidate pool against a task context, applies optional
//! mode-based re-ranking, and groups by severity. Sorting is stable
//! throughout, so equal scores keep their input order.

use super::models::{RankingConfig, RankingMode, ScoredDirective};
use super::scoring::{calculate_score, round_score};
use crate::detection::{TaskContext, Vocabulary};
use crate::directives::{Directive, Severity};
use std::sync::Arc;
use tracing::debug;

/// Multiplicative boost for directives matching the active mode's topics
const MODE_BOOST: f64 = 1.25;

/// Scored directives partitioned by severity, relative order preserved
#[derive(Debug, Clone, Default)]
pub struct SeverityGroups {
    pub must: Vec<ScoredDirective>,
    pub should: Vec<ScoredDirective>,
    pub may: Vec<ScoredDirective>,
}

impl SeverityGroups {
    /// Flatten back to a single sequence, MUST first, then SHOULD, then MAY
    pub fn flatten(self) -> Vec<ScoredDirective> {
        let mut out = self.must;
        out.extend(self.should);
        out.extend(self.may);
        out
    }

    pub fn len(&self) -> usize {
        self.must.len() + self.should.len() + self.may.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoring orchestration across a candidate pool
pub struct RankingEngine {
    vocabulary: Arc<Vocabulary>,
    config: Arc<RankingConfig>,
}

impl RankingEngine {
    pub fn new(vocabulary: Arc<Vocabulary>, config: Arc<RankingConfig>) -> Self {
        Self { vocabulary, config }
    }

    /// Score every candidate and sort descending (stable)
    ///
    /// `config_override` replaces the process-wide config for this call.
    pub fn score_directives(
        &self,
        directives: &[Directive],
        context: &TaskContext,
        config_override: Option<&RankingConfig>,
    ) -> Vec<ScoredDirective> {
        let config = config_override.unwrap_or(&self.config);

        let mut scored: Vec<ScoredDirective> = directives
            .iter()
            .map(|directive| {
                let (score, score_breakdown) =
                    calculate_score(directive, context, config, &self.vocabulary);
                ScoredDirective {
                    directive: directive.clone(),
                    score,
                    score_breakdown,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            "Scored {} directives against layer={} (top score: {:.2})",
            scored.len(),
            context.layer,
            scored.first().map(|s| s.score).unwrap_or(0.0)
        );

        scored
    }

    /// Boost directives whose topics intersect the mode's topic set, then
    /// re-sort stably. No mode is a no-op.
    pub fn apply_mode_adjustments(
        &self,
        mut scored: Vec<ScoredDirective>,
        mode: Option<RankingMode>,
    ) -> Vec<ScoredDirective> {
        let Some(mode) = mode else {
            return scored;
        };

        let boosted_topics = mode.boosted_topics();
        let mut boosted = 0usize;
        for item in &mut scored {
            let matches_mode = item
                .directive
                .topics
                .iter()
                .any(|t| boosted_topics.contains(&t.as_str()));
            if matches_mode {
                item.score = round_score(item.score * MODE_BOOST);
                boosted += 1;
            }
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!("Mode {:?} boosted {} directives", mode, boosted);
        scored
    }

    /// Partition by severity, preserving relative order within each bucket
    pub fn group_by_severity(&self, scored: Vec<ScoredDirective>) -> SeverityGroups {
        let mut groups = SeverityGroups::default();
        for item in scored {
            match item.directive.severity {
                Severity::Must => groups.must.push(item),
                Severity::Should => groups.should.push(item),
                Severity::May => groups.may.push(item),
            }
        }
        groups
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionDiagnostics;
    use std::collections::BTreeSet;

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

    fn context(layer: &str, topics: &[&str]) -> TaskContext {
        TaskContext {
            layer: layer.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            keywords: vec![],
            technologies: BTreeSet::new(),
            confidence: 0.8,
            diagnostics: DetectionDiagnostics {
                model_provider: None,
                fallback_used: true,
                detection_time_ms: 0,
            },
        }
    }

    fn engine() -> RankingEngine {
        RankingEngine::new(
            Arc::new(Vocabulary::builtin()),
            Arc::new(RankingConfig::default()),
        )
    }

    fn sample_pool() -> Vec<Directive> {
        vec![
            directive("d-1", Severity::May, &["coding-standards"], "Prefer descriptive names"),
            directive("d-2", Severity::Must, &["security"], "Validate all tokens"),
            directive("d-3", Severity::Should, &["architecture"], "Keep modules decoupled"),
            directive("d-4", Severity::Must, &["security", "api"], "Authenticate api endpoint calls"),
        ]
    }

    #[test]
    fn test_scores_sorted_descending() {
        let scored = engine().score_directives(&sample_pool(), &context("2-application", &["security"]), None);

        assert_eq!(scored.len(), 4);
        for pair in scored.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let pool = sample_pool();
        let ctx = context("2-application", &["security", "api"]);

        let first = engine().score_directives(&pool, &ctx, None);
        let second = engine().score_directives(&pool, &ctx, None);

        let ids_first: Vec<&str> = first.iter().map(|s| s.directive.id.as_str()).collect();
        let ids_second: Vec<&str> = second.iter().map(|s| s.directive.id.as_str()).collect();
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        // Two identical directives differing only in id tie exactly
        let pool = vec![
            directive("first", Severity::Should, &["security"], "Same text"),
            directive("second", Severity::Should, &["security"], "Same text"),
        ];
        let scored = engine().score_directives(&pool, &context("*", &["security"]), None);

        assert_eq!(scored[0].score, scored[1].score);
        assert_eq!(scored[0].directive.id, "first");
        assert_eq!(scored[1].directive.id, "second");
    }

    #[test]
    fn test_mode_adjustment_boosts_matching_topics() {
        let pool = vec![
            directive("arch", Severity::Should, &["architecture"], "Design module boundaries"),
            directive("sec", Severity::Should, &["security"], "Validate tokens"),
        ];
        let ctx = context("*", &["architecture", "security"]);
        let engine = engine();

        let scored = engine.score_directives(&pool, &ctx, None);
        let adjusted = engine.apply_mode_adjustments(scored.clone(), Some(RankingMode::Architect));

        let arch_before = scored.iter().find(|s| s.directive.id == "arch").unwrap().score;
        let arch_after = adjusted.iter().find(|s| s.directive.id == "arch").unwrap().score;
        let sec_before = scored.iter().find(|s| s.directive.id == "sec").unwrap().score;
        let sec_after = adjusted.iter().find(|s| s.directive.id == "sec").unwrap().score;

        assert!(arch_after > arch_before);
        assert_eq!(sec_after, sec_before);
    }

    #[test]
    fn test_absent_mode_is_noop() {
        let scored = engine().score_directives(&sample_pool(), &context("*", &["security"]), None);
        let adjusted = engine().apply_mode_adjustments(scored.clone(), None);

        let before: Vec<&str> = scored.iter().map(|s| s.directive.id.as_str()).collect();
        let after: Vec<&str> = adjusted.iter().map(|s| s.directive.id.as_str()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_group_by_severity_preserves_relative_order() {
        let scored = engine().score_directives(
            &sample_pool(),
            &context("2-application", &["security", "api"]),
            None,
        );
        let must_order: Vec<String> = scored
            .iter()
            .filter(|s| s.directive.severity == Severity::Must)
            .map(|s| s.directive.id.clone())
            .collect();

        let groups = engine().group_by_severity(scored);
        let grouped_order: Vec<String> =
            groups.must.iter().map(|s| s.directive.id.clone()).collect();

        assert_eq!(grouped_order, must_order);
        assert_eq!(groups.should.len(), 1);
        assert_eq!(groups.may.len(), 1);
    }

    #[test]
    fn test_flatten_orders_must_should_may() {
        let groups = engine().group_by_severity(engine().score_directives(
            &sample_pool(),
            &context("*", &[]),
            None,
        ));
        let flat = groups.flatten();

        let severities: Vec<Severity> = flat.iter().map(|s| s.directive.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
    }

    #[test]
    fn test_config_override_changes_scores() {
        let pool = vec![directive("d-1", Severity::Must, &["security"], "Validate tokens")];
        let ctx = context("*", &["security"]);
        let engine = engine();

        let base = engine.score_directives(&pool, &ctx, None);

        let mut heavier = RankingConfig::default();
        heavier.weights.authority = 1.0;
        let boosted = engine.score_directives(&pool, &ctx, Some(&heavier));

        assert!(boosted[0].score > base[0].score);
    }
}
