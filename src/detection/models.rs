//! Data models for context detection

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Layer tag meaning "unclassified"
pub const WILDCARD_LAYER: &str = "*";

/// Confidence floor reported when detection ran but found nothing, or when
/// detection itself failed. Distinguishes "no signal" from "crashed" by
/// pairing the floor with `fallback_used` in diagnostics.
pub const FLOOR_CONFIDENCE: f64 = 0.1;

/// Inferred context for a free-text task description
///
/// Derived fresh per query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    /// Architectural layer tag, or `"*"` when unclassified
    pub layer: String,
    /// Domain topics detected in the task text
    pub topics: BTreeSet<String>,
    /// Task keywords; populated only when requested
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Technology tags detected in the task text
    pub technologies: BTreeSet<String>,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    pub diagnostics: DetectionDiagnostics,
}

impl TaskContext {
    /// Floor context returned when every detection path failed
    pub fn floor(detection_time_ms: u64) -> Self {
        Self {
            layer: WILDCARD_LAYER.to_string(),
            topics: BTreeSet::new(),
            keywords: Vec::new(),
            technologies: BTreeSet::new(),
            confidence: FLOOR_CONFIDENCE,
            diagnostics: DetectionDiagnostics {
                model_provider: None,
                fallback_used: true,
                detection_time_ms,
            },
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.layer == WILDCARD_LAYER
    }
}

/// How the context was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDiagnostics {
    /// Name of the model provider that answered, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
    /// True when no provider answered and the rule-based detector ran
    pub fallback_used: bool,
    /// End-to-end detection time
    pub detection_time_ms: u64,
}

/// Options for a detection request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DetectOptions {
    /// Populate `TaskContext::keywords`; off by default to avoid
    /// unnecessary work
    #[serde(default)]
    pub return_keywords: bool,
}

/// Raw detection result returned by a model provider, before the engine
/// wraps it with diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderContext {
    pub layer: String,
    #[serde(default)]
    pub topics: BTreeSet<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    pub confidence: f64,
}

impl ProviderContext {
    /// Clamp provider-supplied values into their declared ranges
    pub fn normalized(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        if self.layer.is_empty() {
            self.layer = WILDCARD_LAYER.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_context_contract() {
        let ctx = TaskContext::floor(12);
        assert_eq!(ctx.layer, WILDCARD_LAYER);
        assert_eq!(ctx.confidence, FLOOR_CONFIDENCE);
        assert!(ctx.diagnostics.fallback_used);
        assert!(ctx.diagnostics.model_provider.is_none());
        assert_eq!(ctx.diagnostics.detection_time_ms, 12);
    }

    #[test]
    fn test_provider_context_normalization() {
        let ctx = ProviderContext {
            layer: String::new(),
            topics: BTreeSet::new(),
            keywords: vec![],
            technologies: BTreeSet::new(),
            confidence: 1.7,
        }
        .normalized();

        assert_eq!(ctx.layer, WILDCARD_LAYER);
        assert_eq!(ctx.confidence, 1.0);
    }

    #[test]
    fn test_provider_context_deserializes_sparse_json() {
        let json = r#"{"layer": "2-application", "confidence": 0.8}"#;
        let ctx: ProviderContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.layer, "2-application");
        assert!(ctx.topics.is_empty());
    }
}
