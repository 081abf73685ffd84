//! Severity-aware greedy budget allocation

use super::token_estimator::{CharBasedEstimator, TokenEstimator};
use crate::ranking::{ScoredDirective, TokenEstimationConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of one allocation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocationResult {
    /// Selected directives in the order they were accepted
    pub selected: Vec<ScoredDirective>,
    /// All input items, included or not
    pub items_considered: usize,
    pub items_included: usize,
    /// Estimated tokens of the selection; never exceeds the budget
    pub total_tokens: usize,
    /// `budget - total_tokens`, never negative
    pub budget_remaining: usize,
}

/// Greedy token-budget allocator
///
/// Callers pass already-ranked, severity-grouped sequences (MUST first,
/// then SHOULD, then MAY); the allocator walks them in order and includes
/// each item that still fits. It keeps scanning past items that do not
/// fit, since a later cheaper item may.
pub struct TokenBudgetAllocator {
    estimator: Arc<dyn TokenEstimator>,
}

impl TokenBudgetAllocator {
    pub fn new(estimator: Arc<dyn TokenEstimator>) -> Self {
        Self { estimator }
    }

    /// Allocator backed by the deterministic char-based estimator
    pub fn char_based(config: &TokenEstimationConfig) -> Self {
        Self::new(Arc::new(CharBasedEstimator::new(config)))
    }

    /// Select directives within `budget` tokens
    ///
    /// The budget is a hard ceiling: an item that alone exceeds it is
    /// excluded, even the first MUST. A budget below the cheapest MUST
    /// directive therefore yields an empty selection; that is documented
    /// behavior, not a bug.
    pub fn allocate_budget_by_severity(
        &self,
        items: Vec<ScoredDirective>,
        budget: usize,
    ) -> BudgetAllocationResult {
        let items_considered = items.len();
        let mut selected = Vec::new();
        let mut total_tokens = 0usize;

        for item in items {
            let item_tokens = self.estimator.estimate(&item.directive.text);
            if total_tokens + item_tokens <= budget {
                total_tokens += item_tokens;
                selected.push(item);
            } else {
                debug!(
                    "Skipping directive {} ({} tokens, {} used of {})",
                    item.directive.id, item_tokens, total_tokens, budget
                );
            }
        }

        BudgetAllocationResult {
            items_included: selected.len(),
            items_considered,
            total_tokens,
            budget_remaining: budget - total_tokens,
            selected,
        }
    }

    /// Estimated token cost of one directive
    pub fn estimate(&self, text: &str) -> usize {
        self.estimator.estimate(text)
    }
}
