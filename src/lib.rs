//! Context-aware directive retrieval, ranking, and token budgeting for LLM agents
//!
//! The core pipeline turns a free-text task description and a pool of
//! stored directives into an ordered, token-bounded selection with
//! explainable scores:
//!
//! 1. **Detection** — infer layer/topics/technologies from the task text,
//!    via model providers with rule-based fallback
//! 2. **Scoring** — six weighted factors per directive, pure and
//!    deterministic
//! 3. **Ranking** — mode-sensitive re-ranking and severity grouping
//! 4. **Budget** — greedy severity-aware selection within a token budget

pub mod api;
pub mod budget;
pub mod config;
pub mod detection;
pub mod directives;
pub mod error;
pub mod metrics;
pub mod query;
pub mod ranking;

pub use budget::{BudgetAllocationResult, TokenBudgetAllocator, TokenEstimator};
pub use config::AppConfig;
pub use detection::{
    ContextDetectionEngine, DetectOptions, ModelProvider, RuleBasedDetector, TaskContext,
    Vocabulary,
};
pub use directives::{Directive, DirectiveFilter, DirectiveStore, InMemoryDirectiveStore, Severity};
pub use error::{RankerError, Result};
pub use query::{QueryOptions, QueryOrchestrator, QueryOutcome};
pub use ranking::{RankingConfig, RankingEngine, RankingMode, ScoredDirective};
