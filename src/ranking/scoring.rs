//! Relevance scoring
//!
//! Pure, deterministic scoring of one directive against one task context.
//! Six sub-scores in [0, 1], combined as a non-negative weighted sum, so
//! the final score is monotonic non-decreasing in every sub-score.

use super::models::{RankingConfig, ScoreBreakdown};
use crate::detection::{TaskContext, Vocabulary};
use crate::directives::Directive;

/// Round to 2 decimal places, the precision scores are reported at
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Substring match in either direction, after lowercasing
fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a == b || a.contains(&b) || b.contains(&a)
}

/// Compute the weighted relevance score and its breakdown
///
/// No side effects; identical inputs always yield identical output.
pub fn calculate_score(
    directive: &Directive,
    context: &TaskContext,
    config: &RankingConfig,
    vocabulary: &Vocabulary,
) -> (f64, ScoreBreakdown) {
    let breakdown = ScoreBreakdown {
        authority: authority_score(directive, context),
        layer_match: layer_match_score(directive, context, vocabulary),
        topic_overlap: topic_overlap_score(directive, context),
        severity_boost: config.severity_multipliers.for_severity(directive.severity),
        semantic_similarity: semantic_similarity_score(directive, context),
        when_to_apply: when_to_apply_score(directive, context),
    };

    let weights = &config.weights;
    let score = breakdown.authority * weights.authority
        + breakdown.layer_match * weights.layer_match
        + breakdown.topic_overlap * weights.topic_overlap
        + breakdown.severity_boost * weights.severity_boost
        + breakdown.semantic_similarity * weights.semantic_similarity
        + breakdown.when_to_apply * weights.when_to_apply;

    (round_score(score), breakdown)
}

/// 1.0 iff any context topic matches a directive topic
///
/// Binary topic overlap stands in for a true rule-authority lookup on the
/// owning document; see DESIGN.md.
fn authority_score(directive: &Directive, context: &TaskContext) -> f64 {
    let matched = context
        .topics
        .iter()
        .any(|ct| directive.topics.iter().any(|dt| fuzzy_match(ct, dt)));
    if matched {
        1.0
    } else {
        0.0
    }
}

/// 0.5 for layer-agnostic directives; otherwise 1.0 when a layer keyword
/// for the context layer appears in the directive's text+topics
fn layer_match_score(directive: &Directive, context: &TaskContext, vocabulary: &Vocabulary) -> f64 {
    if is_layer_agnostic(directive) {
        return 0.5;
    }

    let Some(keywords) = vocabulary.layer_keywords(&context.layer) else {
        return 0.0;
    };

    let mut haystack = directive.text.to_lowercase();
    for topic in &directive.topics {
        haystack.push(' ');
        haystack.push_str(&topic.to_lowercase());
    }

    if keywords.iter().any(|k| haystack.contains(k.as_str())) {
        1.0
    } else {
        0.0
    }
}

fn is_layer_agnostic(directive: &Directive) -> bool {
    if directive.topics.contains("*") {
        return true;
    }
    directive.when_to_apply.iter().any(|condition| {
        condition
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| matches!(word, "all" | "any" | "always"))
    })
}

/// Fuzzy topic intersection over the larger topic set
fn topic_overlap_score(directive: &Directive, context: &TaskContext) -> f64 {
    if directive.topics.is_empty() || context.topics.is_empty() {
        return 0.0;
    }

    let matched = directive
        .topics
        .iter()
        .filter(|dt| context.topics.iter().any(|ct| fuzzy_match(dt, ct)))
        .count();

    matched as f64 / directive.topics.len().max(context.topics.len()) as f64
}

/// Fraction of task keywords appearing in the directive text+rationale
fn semantic_similarity_score(directive: &Directive, context: &TaskContext) -> f64 {
    let keywords: Vec<&String> = context.keywords.iter().filter(|k| k.len() > 2).collect();
    if keywords.is_empty() {
        return 0.0;
    }

    let mut haystack = directive.text.to_lowercase();
    if let Some(ref rationale) = directive.rationale {
        haystack.push(' ');
        haystack.push_str(&rationale.to_lowercase());
    }

    let matched = keywords
        .iter()
        .filter(|k| haystack.contains(k.to_lowercase().as_str()))
        .count();

    matched as f64 / keywords.len() as f64
}

/// Fraction of when-to-apply conditions sharing a word with the task keywords
fn when_to_apply_score(directive: &Directive, context: &TaskContext) -> f64 {
    if directive.when_to_apply.is_empty() || context.keywords.is_empty() {
        return 0.0;
    }

    let matched = directive
        .when_to_apply
        .iter()
        .filter(|condition| {
            condition
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .any(|word| context.keywords.iter().any(|k| fuzzy_match(word, k)))
        })
        .count();

    matched as f64 / directive.when_to_apply.len() as f64
}
