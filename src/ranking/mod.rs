//! Scoring and ranking of directives against a task context

pub mod engine;
pub mod models;
pub mod scoring;

pub use engine::{RankingEngine, SeverityGroups};
pub use models::{
    RankingConfig, RankingMode, RankingWeights, ScoreBreakdown, ScoredDirective,
    SeverityMultipliers, TokenEstimationConfig,
};
pub use scoring::{calculate_score, round_score};
