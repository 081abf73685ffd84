//! Context detection engine
//!
//! Walks the provider chain, falls back to the rule-based detector, and
//! guarantees a valid `TaskContext` to downstream ranking no matter what
//! fails along the way.

use super::cache::{DetectionCache, DetectionCacheConfig};
use super::models::{DetectOptions, ProviderContext, TaskContext};
use super::provider::ModelProvider;
use super::rule_based::{extract_keywords, RuleBasedDetector};
use crate::error::{RankerError, Result};
use crate::metrics::METRICS;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for the detection engine
#[derive(Debug, Clone)]
pub struct DetectionEngineConfig {
    /// Ceiling for a single provider call; the call is cancelled when the
    /// deadline passes and the chain moves on
    pub provider_timeout: Duration,
    /// Detection cache; None disables caching
    pub cache: Option<DetectionCacheConfig>,
}

impl Default for DetectionEngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(5),
            cache: Some(DetectionCacheConfig::default()),
        }
    }
}

/// Multi-source context detection with fallback
///
/// Sources are tried in priority order: configured model providers first,
/// then the internal rule-based detector. `detect_context` never fails;
/// every failure path degrades to a lower-confidence result.
pub struct ContextDetectionEngine {
    providers: Vec<Arc<dyn ModelProvider>>,
    detector: RuleBasedDetector,
    provider_timeout: Duration,
    cache: Option<DetectionCache>,
    failures: DashMap<String, u64>,
}

impl ContextDetectionEngine {
    pub fn new(
        providers: Vec<Arc<dyn ModelProvider>>,
        detector: RuleBasedDetector,
        config: DetectionEngineConfig,
    ) -> Self {
        Self {
            providers,
            detector,
            provider_timeout: config.provider_timeout,
            cache: config.cache.map(DetectionCache::new),
            failures: DashMap::new(),
        }
    }

    /// Rule-based-only engine, used when no providers are configured
    pub fn rule_based_only(detector: RuleBasedDetector) -> Self {
        Self::new(Vec::new(), detector, DetectionEngineConfig::default())
    }

    /// Detect task context; never returns an error
    ///
    /// Downstream ranking always receives a valid context: if providers and
    /// the rule-based detector all fail, the wildcard/floor context is
    /// returned with `fallback_used` set.
    pub async fn detect_context(&self, text: &str, options: DetectOptions) -> TaskContext {
        let started = Instant::now();

        if let Some(cache) = &self.cache {
            if let Some(mut hit) = cache.get(text, options.return_keywords).await {
                hit.diagnostics.detection_time_ms = started.elapsed().as_millis() as u64;
                debug!("Detection cache hit (layer={})", hit.layer);
                return hit;
            }
        }

        let mut context = match self.detect_inner(text, options).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Detection failed entirely, returning floor context: {}", e);
                TaskContext::floor(0)
            }
        };
        context.diagnostics.detection_time_ms = started.elapsed().as_millis() as u64;

        if let Some(cache) = &self.cache {
            cache
                .store(text, options.return_keywords, context.clone())
                .await;
        }

        context
    }

    async fn detect_inner(&self, text: &str, options: DetectOptions) -> Result<TaskContext> {
        for provider in &self.providers {
            if !provider.is_available().await {
                debug!("Provider '{}' unavailable, skipping", provider.name());
                continue;
            }

            match tokio::time::timeout(self.provider_timeout, provider.detect_context(text)).await
            {
                Ok(Ok(raw)) => {
                    debug!("Provider '{}' answered", provider.name());
                    return Ok(self.wrap_provider_context(raw, provider.name(), text, options));
                }
                Ok(Err(e)) => {
                    self.record_failure(provider.name());
                    warn!("Provider '{}' failed: {}", provider.name(), e);
                }
                Err(_) => {
                    self.record_failure(provider.name());
                    warn!(
                        "Provider '{}' timed out after {:?}",
                        provider.name(),
                        self.provider_timeout
                    );
                }
            }
        }

        // All providers failed or none configured: rule-based detection
        METRICS.detection_fallbacks.inc();

        if self.detector.vocabulary().is_empty() {
            return Err(RankerError::Configuration(
                "Vocabulary has no layers; rule-based detection cannot run".to_string(),
            ));
        }

        let detection = self.detector.detect(text);
        let keywords = if options.return_keywords {
            extract_keywords(text)
        } else {
            Vec::new()
        };

        let mut context = TaskContext::floor(0);
        context.layer = detection.layer;
        context.topics = detection.topics;
        context.technologies = detection.technologies;
        context.confidence = detection.confidence;
        context.keywords = keywords;
        Ok(context)
    }

    fn wrap_provider_context(
        &self,
        raw: ProviderContext,
        provider_name: &str,
        text: &str,
        options: DetectOptions,
    ) -> TaskContext {
        let raw = raw.normalized();
        let keywords = if options.return_keywords {
            if raw.keywords.is_empty() {
                extract_keywords(text)
            } else {
                raw.keywords
            }
        } else {
            Vec::new()
        };

        TaskContext {
            layer: raw.layer,
            topics: raw.topics,
            keywords,
            technologies: raw.technologies,
            confidence: raw.confidence,
            diagnostics: super::models::DetectionDiagnostics {
                model_provider: Some(provider_name.to_string()),
                fallback_used: false,
                detection_time_ms: 0,
            },
        }
    }

    fn record_failure(&self, provider: &str) {
        *self.failures.entry(provider.to_string()).or_insert(0) += 1;
        METRICS
            .provider_failures
            .with_label_values(&[provider])
            .inc();
    }

    /// Cumulative failure count for one provider
    pub fn failure_count(&self, provider: &str) -> u64 {
        self.failures.get(provider).map(|v| *v).unwrap_or(0)
    }
}
