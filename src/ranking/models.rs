//! Data models for scoring and ranking

use crate::directives::{Directive, Severity};
use crate::error::{RankerError, Result};
use serde::{Deserialize, Serialize};

/// Weights for the six scoring factors
///
/// All weights must be positive; relative magnitude is what matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingWeights {
    #[serde(default = "default_authority_weight")]
    pub authority: f64,
    #[serde(default = "default_when_to_apply_weight")]
    pub when_to_apply: f64,
    #[serde(default = "default_layer_match_weight")]
    pub layer_match: f64,
    #[serde(default = "default_topic_overlap_weight")]
    pub topic_overlap: f64,
    #[serde(default = "default_severity_boost_weight")]
    pub severity_boost: f64,
    #[serde(default = "default_semantic_similarity_weight")]
    pub semantic_similarity: f64,
}

fn default_authority_weight() -> f64 {
    0.25
}
fn default_when_to_apply_weight() -> f64 {
    0.10
}
fn default_layer_match_weight() -> f64 {
    0.20
}
fn default_topic_overlap_weight() -> f64 {
    0.20
}
fn default_severity_boost_weight() -> f64 {
    0.15
}
fn default_semantic_similarity_weight() -> f64 {
    0.10
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            authority: default_authority_weight(),
            when_to_apply: default_when_to_apply_weight(),
            layer_match: default_layer_match_weight(),
            topic_overlap: default_topic_overlap_weight(),
            severity_boost: default_severity_boost_weight(),
            semantic_similarity: default_semantic_similarity_weight(),
        }
    }
}

/// Per-severity multipliers, each in (0, 1], MUST ≥ SHOULD ≥ MAY
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityMultipliers {
    #[serde(default = "default_must")]
    pub must: f64,
    #[serde(default = "default_should")]
    pub should: f64,
    #[serde(default = "default_may")]
    pub may: f64,
}

fn default_must() -> f64 {
    1.0
}
fn default_should() -> f64 {
    0.7
}
fn default_may() -> f64 {
    0.4
}

impl Default for SeverityMultipliers {
    fn default() -> Self {
        Self {
            must: default_must(),
            should: default_should(),
            may: default_may(),
        }
    }
}

impl SeverityMultipliers {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Must => self.must,
            Severity::Should => self.should,
            Severity::May => self.may,
        }
    }
}

/// Token estimation parameters for the budget allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEstimationConfig {
    /// Average characters per token for the char-based estimator
    #[serde(default = "default_avg_chars_per_token")]
    pub avg_chars_per_token: f64,
    /// Fixed per-directive overhead (separators, severity tag, breadcrumb)
    #[serde(default = "default_overhead_tokens")]
    pub overhead_tokens: usize,
}

fn default_avg_chars_per_token() -> f64 {
    4.0
}
fn default_overhead_tokens() -> usize {
    8
}

impl Default for TokenEstimationConfig {
    fn default() -> Self {
        Self {
            avg_chars_per_token: default_avg_chars_per_token(),
            overhead_tokens: default_overhead_tokens(),
        }
    }
}

/// Process-wide ranking configuration, override-able per call
///
/// Validated once at configuration-load time; an invalid config is fatal
/// before any query runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub weights: RankingWeights,
    #[serde(default)]
    pub severity_multipliers: SeverityMultipliers,
    #[serde(default)]
    pub token_estimation: TokenEstimationConfig,
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("authority", self.weights.authority),
            ("when_to_apply", self.weights.when_to_apply),
            ("layer_match", self.weights.layer_match),
            ("topic_overlap", self.weights.topic_overlap),
            ("severity_boost", self.weights.severity_boost),
            ("semantic_similarity", self.weights.semantic_similarity),
        ];
        for (name, value) in weights {
            if value <= 0.0 || !value.is_finite() {
                return Err(RankerError::Configuration(format!(
                    "Ranking weight '{}' must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let multipliers = [
            ("must", self.severity_multipliers.must),
            ("should", self.severity_multipliers.should),
            ("may", self.severity_multipliers.may),
        ];
        for (name, value) in multipliers {
            if value <= 0.0 || value > 1.0 {
                return Err(RankerError::Configuration(format!(
                    "Severity multiplier '{}' must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.severity_multipliers.must < self.severity_multipliers.should
            || self.severity_multipliers.should < self.severity_multipliers.may
        {
            return Err(RankerError::Configuration(
                "Severity multipliers must satisfy MUST >= SHOULD >= MAY".to_string(),
            ));
        }

        if self.token_estimation.avg_chars_per_token <= 0.0 {
            return Err(RankerError::Configuration(format!(
                "avg_chars_per_token must be positive, got {}",
                self.token_estimation.avg_chars_per_token
            )));
        }

        Ok(())
    }
}

/// Unweighted sub-scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub authority: f64,
    pub layer_match: f64,
    pub topic_overlap: f64,
    pub severity_boost: f64,
    pub semantic_similarity: f64,
    pub when_to_apply: f64,
}

/// A directive with its relevance score and explainable breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDirective {
    #[serde(flatten)]
    pub directive: Directive,
    /// Weighted sum of the breakdown, rounded to 2 decimals, never negative
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
}

/// Re-ranking mode applied on top of the base scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    Architect,
    Code,
    Debug,
}

impl RankingMode {
    /// Parse a mode slug; unknown slugs are treated as "no mode"
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "architect" => Some(Self::Architect),
            "code" => Some(Self::Code),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Topics boosted by this mode
    pub fn boosted_topics(&self) -> &'static [&'static str] {
        match self {
            Self::Architect => &["architecture", "design"],
            Self::Code => &["testing", "coding-standards"],
            Self::Debug => &["error-handling", "logging"],
        }
    }
}
