//! Directive store seam
//!
//! Persistence lives in an external knowledge store; the ranking core only
//! needs a query capability. `DirectiveStore` is that seam, and the
//! in-memory implementation backs the HTTP layer and tests.

use super::models::{Directive, DirectiveFilter};
use crate::error::{RankerError, Result};
use async_trait::async_trait;
use glob::Pattern;
use tracing::{debug, warn};

/// Query capability over stored directives
#[async_trait]
pub trait DirectiveStore: Send + Sync {
    /// Fetch candidate directives, optionally pre-filtered by
    /// workspace/layer/severity
    async fn fetch(&self, filter: &DirectiveFilter) -> Result<Vec<Directive>>;

    /// Number of directives currently visible to queries
    async fn len(&self) -> Result<usize>;
}

/// In-memory directive store
///
/// Holds an immutable snapshot of ingested directives. Invalid records are
/// rejected at construction, keeping the validation at the ingestion
/// boundary.
pub struct InMemoryDirectiveStore {
    directives: Vec<Directive>,
}

impl InMemoryDirectiveStore {
    /// Create a store from ingested directives, validating each record
    pub fn new(directives: Vec<Directive>) -> Result<Self> {
        for directive in &directives {
            directive
                .validate()
                .map_err(RankerError::Store)?;
        }
        debug!("Loaded {} directives into in-memory store", directives.len());
        Ok(Self { directives })
    }

    /// Load directives from a JSON array document
    pub fn from_json(raw: &str) -> Result<Self> {
        let directives: Vec<Directive> = serde_json::from_str(raw)
            .map_err(|e| RankerError::Store(format!("Failed to parse directives: {}", e)))?;
        Self::new(directives)
    }

    fn matches(directive: &Directive, filter: &DirectiveFilter) -> bool {
        if let Some(ref workspace) = filter.workspace {
            match Pattern::new(workspace) {
                Ok(pattern) => {
                    if !pattern.matches(&directive.rule_id) {
                        return false;
                    }
                }
                Err(e) => {
                    warn!("Invalid workspace pattern '{}': {}", workspace, e);
                    return false;
                }
            }
        }

        if let Some(ref layer) = filter.layer {
            let layer_ok = directive.layers.is_empty()
                || directive.layers.contains("*")
                || directive.layers.contains(layer);
            if !layer_ok {
                return false;
            }
        }

        if let Some(ref severities) = filter.severities {
            if !severities.contains(&directive.severity) {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl DirectiveStore for InMemoryDirectiveStore {
    async fn fetch(&self, filter: &DirectiveFilter) -> Result<Vec<Directive>> {
        let candidates: Vec<Directive> = self
            .directives
            .iter()
            .filter(|d| Self::matches(d, filter))
            .cloned()
            .collect();

        debug!(
            "Fetched {} of {} directives (filter: {:?})",
            candidates.len(),
            self.directives.len(),
            filter
        );

        Ok(candidates)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.directives.len())
    }
}
