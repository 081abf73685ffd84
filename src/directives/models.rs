//! Data models for stored directives

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Directive severity, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Must,
    Should,
    May,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Must => "MUST",
            Self::Should => "SHOULD",
            Self::May => "MAY",
        }
    }

    /// All severities in priority order
    pub fn ordered() -> [Severity; 3] {
        [Self::Must, Self::Should, Self::May]
    }
}

/// A single MUST/SHOULD/MAY guidance statement extracted from a rule document
///
/// Created once by the ingestion pipeline; the ranking core never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// Unique directive id
    pub id: String,
    /// Owning rule document
    pub rule_id: String,
    /// Breadcrumb into the source document
    pub section: String,
    pub severity: Severity,
    /// The guidance statement itself
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_pattern: Option<String>,
    /// Domain topics, e.g. "security", "testing"
    #[serde(default)]
    pub topics: BTreeSet<String>,
    /// Architectural layer tags the directive applies to
    #[serde(default)]
    pub layers: BTreeSet<String>,
    /// Technology tags, e.g. "react", "postgres"
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    /// Conditions under which the directive applies, e.g. "api-development"
    #[serde(default)]
    pub when_to_apply: Vec<String>,
}

impl Directive {
    /// Validate the shape produced by the ingestion boundary
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Directive id cannot be empty".to_string());
        }
        if self.rule_id.is_empty() {
            return Err(format!("Directive {} has an empty rule_id", self.id));
        }
        if self.text.is_empty() {
            return Err(format!("Directive {} has empty text", self.id));
        }
        Ok(())
    }
}

/// Filter for candidate retrieval from a directive store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectiveFilter {
    /// Glob pattern matched against the owning rule document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Restrict to directives tagged with this layer (wildcard-tagged
    /// directives always pass)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Restrict to these severities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severities: Option<Vec<Severity>>,
}

impl DirectiveFilter {
    pub fn is_empty(&self) -> bool {
        self.workspace.is_none() && self.layer.is_none() && self.severities.is_none()
    }
}
