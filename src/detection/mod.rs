//! Context detection: providers, fallback chain, rule-based matcher

pub mod cache;
pub mod engine;
pub mod http_provider;
pub mod models;
pub mod provider;
pub mod rule_based;
pub mod vocabulary;

pub use cache::{DetectionCache, DetectionCacheConfig};
pub use engine::{ContextDetectionEngine, DetectionEngineConfig};
pub use http_provider::{HttpModelProvider, HttpProviderConfig};
pub use models::{
    DetectOptions, DetectionDiagnostics, ProviderContext, TaskContext, FLOOR_CONFIDENCE,
    WILDCARD_LAYER,
};
pub use provider::{ModelProvider, ProviderError};
pub use rule_based::{extract_keywords, tokenize_words, RuleBasedDetector, RuleDetection};
pub use vocabulary::{LayerProfile, Vocabulary};
