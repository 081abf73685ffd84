//! Layer and domain vocabulary tables
//!
//! Static keyword tables backing the rule-based detector and the layer
//! sub-score. Declaration order is significant: layer tie-breaks resolve to
//! the earliest declared layer, so the tables use insertion-ordered maps.

use indexmap::IndexMap;

/// One architectural layer with its weighted keyword set
#[derive(Debug, Clone)]
pub struct LayerProfile {
    pub tag: String,
    /// Static per-layer weight applied to the normalized keyword score
    pub weight: f64,
    pub keywords: Vec<String>,
}

/// Immutable keyword tables for layers, domain topics, and technologies
///
/// Constructed once at startup and shared read-only across queries.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    layers: IndexMap<String, LayerProfile>,
    topics: IndexMap<String, Vec<String>>,
    technologies: Vec<String>,
}

fn profile(tag: &str, weight: f64, keywords: &[&str]) -> (String, LayerProfile) {
    (
        tag.to_string(),
        LayerProfile {
            tag: tag.to_string(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        },
    )
}

impl Vocabulary {
    /// Built-in tables covering the five standard layers
    pub fn builtin() -> Self {
        let layers = IndexMap::from([
            profile(
                "1-presentation",
                1.2,
                &[
                    "react", "vue", "angular", "css", "html", "component", "ui", "frontend",
                    "styling", "layout", "responsive", "accessibility",
                ],
            ),
            profile(
                "2-application",
                1.0,
                &[
                    "api", "service", "endpoint", "controller", "handler", "rest", "graphql",
                    "middleware", "route", "session", "workflow", "orchestration",
                ],
            ),
            profile(
                "3-domain",
                1.0,
                &[
                    "business", "domain", "entity", "aggregate", "invariant", "validation",
                    "model", "rule", "policy", "calculation",
                ],
            ),
            profile(
                "4-persistence",
                1.1,
                &[
                    "database", "sql", "query", "migration", "repository", "orm", "postgres",
                    "index", "transaction", "schema", "storage",
                ],
            ),
            profile(
                "5-infrastructure",
                1.0,
                &[
                    "docker", "kubernetes", "deploy", "deployment", "pipeline", "terraform",
                    "cloud", "monitoring", "scaling", "network", "infrastructure",
                ],
            ),
        ]);

        let topics = IndexMap::from([
            (
                "security".to_string(),
                words(&[
                    "auth", "authentication", "authorization", "security", "encryption",
                    "vulnerability", "injection", "xss", "csrf", "token", "password", "secret",
                ]),
            ),
            (
                "testing".to_string(),
                words(&["test", "testing", "unit", "integration", "mock", "coverage", "assertion"]),
            ),
            (
                "error-handling".to_string(),
                words(&["error", "exception", "failure", "retry", "fallback", "recovery", "timeout"]),
            ),
            (
                "performance".to_string(),
                words(&["performance", "latency", "cache", "caching", "optimize", "optimization", "throughput"]),
            ),
            (
                "architecture".to_string(),
                words(&["architecture", "design", "pattern", "structure", "module", "boundary", "coupling"]),
            ),
            (
                "coding-standards".to_string(),
                words(&["style", "lint", "linting", "naming", "convention", "format", "formatting", "refactor"]),
            ),
            (
                "logging".to_string(),
                words(&["log", "logging", "trace", "tracing", "observability", "metric", "metrics"]),
            ),
            (
                "api".to_string(),
                words(&["api", "rest", "endpoint", "graphql", "request", "response", "contract", "versioning"]),
            ),
            (
                "documentation".to_string(),
                words(&["docs", "documentation", "readme", "comment", "changelog"]),
            ),
        ]);

        let technologies = words(&[
            "react", "vue", "angular", "typescript", "javascript", "rust", "python", "java",
            "postgres", "postgresql", "mysql", "redis", "docker", "kubernetes", "terraform",
            "kafka", "graphql", "css", "html",
        ]);

        Self {
            layers,
            topics,
            technologies,
        }
    }

    /// Layers in declaration order
    pub fn layers(&self) -> impl Iterator<Item = &LayerProfile> {
        self.layers.values()
    }

    /// Keyword list for one layer tag
    pub fn layer_keywords(&self, tag: &str) -> Option<&[String]> {
        self.layers.get(tag).map(|p| p.keywords.as_slice())
    }

    /// Topics in declaration order
    pub fn topics(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.topics.iter()
    }

    pub fn technologies(&self) -> &[String] {
        &self.technologies
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            layers: IndexMap::new(),
            topics: IndexMap::new(),
            technologies: Vec::new(),
        }
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|w| w.to_string()).collect()
}
