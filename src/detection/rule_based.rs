//! Rule-based context detector
//!
//! Last stop of the detection fallback chain: a deterministic keyword
//! matcher over the static vocabulary tables. Always produces a result.

use super::models::{FLOOR_CONFIDENCE, WILDCARD_LAYER};
use super::vocabulary::Vocabulary;
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of rule-based detection
#[derive(Debug, Clone)]
pub struct RuleDetection {
    pub layer: String,
    /// Layer keywords that actually matched the task text
    pub indicators: Vec<String>,
    pub topics: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub confidence: f64,
}

/// Deterministic keyword matcher over the vocabulary tables
pub struct RuleBasedDetector {
    vocabulary: Vocabulary,
}

impl RuleBasedDetector {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Detect layer, topics, and technologies from task text
    ///
    /// Layer scoring: per layer, count keyword hits in the tokenized word
    /// set, normalize by keyword-list length, multiply by the static layer
    /// weight. Highest score wins; ties resolve to the earliest declared
    /// layer. A text with no layer hits at all yields the wildcard layer
    /// and the confidence floor.
    pub fn detect(&self, text: &str) -> RuleDetection {
        let word_set = tokenize_words(text);

        let mut best: Option<(&str, f64, Vec<String>)> = None;
        for layer in self.vocabulary.layers() {
            if layer.keywords.is_empty() {
                continue;
            }

            let matched: Vec<String> = layer
                .keywords
                .iter()
                .filter(|k| word_set.contains(k.as_str()))
                .cloned()
                .collect();

            let normalized = matched.len() as f64 / layer.keywords.len() as f64;
            let weighted = normalized * layer.weight;

            // Strict comparison keeps the first declared layer on ties
            if weighted > best.as_ref().map(|(_, score, _)| *score).unwrap_or(0.0) {
                best = Some((layer.tag.as_str(), weighted, matched));
            }
        }

        let topics: BTreeSet<String> = self
            .vocabulary
            .topics()
            .filter(|(_, keywords)| keywords.iter().any(|k| word_set.contains(k.as_str())))
            .map(|(name, _)| name.clone())
            .collect();

        let technologies: BTreeSet<String> = self
            .vocabulary
            .technologies()
            .iter()
            .filter(|t| word_set.contains(t.as_str()))
            .cloned()
            .collect();

        match best {
            Some((tag, score, indicators)) => {
                debug!(
                    "Rule-based detection: layer={}, score={:.3}, indicators={:?}",
                    tag, score, indicators
                );
                RuleDetection {
                    layer: tag.to_string(),
                    indicators,
                    topics,
                    technologies,
                    confidence: score.clamp(0.0, 1.0),
                }
            }
            None => RuleDetection {
                layer: WILDCARD_LAYER.to_string(),
                indicators: Vec::new(),
                topics,
                technologies,
                confidence: FLOOR_CONFIDENCE,
            },
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

/// Lower-case and split on non-word boundaries into a word set
pub fn tokenize_words(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Task keywords in text order: words longer than two characters, deduped
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .filter(|w| seen.insert(w.to_string()))
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RuleBasedDetector {
        RuleBasedDetector::new(Vocabulary::builtin())
    }

    #[test]
    fn test_react_css_text_detects_presentation_layer() {
        let detection = detector().detect("Create a React component with CSS styling");

        assert_eq!(detection.layer, "1-presentation");
        assert!(detection.confidence > 0.3);
        assert!(detection.indicators.contains(&"react".to_string()));
        assert!(detection.indicators.contains(&"css".to_string()));
    }

    #[test]
    fn test_no_matches_yields_wildcard_and_floor_confidence() {
        let detection = detector().detect("zzz qqq xyzzy");

        assert_eq!(detection.layer, WILDCARD_LAYER);
        assert_eq!(detection.confidence, FLOOR_CONFIDENCE);
        assert!(detection.indicators.is_empty());
        assert!(detection.topics.is_empty());
    }

    #[test]
    fn test_topic_and_technology_hits() {
        let detection =
            detector().detect("Add authentication to the REST api and cache tokens in redis");

        assert!(detection.topics.contains("security"));
        assert!(detection.topics.contains("api"));
        assert!(detection.technologies.contains("redis"));
    }

    #[test]
    fn test_persistence_text_detects_persistence_layer() {
        let detection = detector().detect("Write a SQL migration for the orders database schema");
        assert_eq!(detection.layer, "4-persistence");
    }

    #[test]
    fn test_detection_is_deterministic() {
        let a = detector().detect("Build a docker deployment pipeline");
        let b = detector().detect("Build a docker deployment pipeline");
        assert_eq!(a.layer, b.layer);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.indicators, b.indicators);
    }

    #[test]
    fn test_tokenize_words() {
        let words = tokenize_words("Handle API-errors, retry/fallback!");
        assert!(words.contains("api"));
        assert!(words.contains("errors"));
        assert!(words.contains("retry"));
        assert!(words.contains("fallback"));
    }

    #[test]
    fn test_extract_keywords_filters_short_words_and_dedupes() {
        let keywords = extract_keywords("Fix an API bug in the API layer");
        assert_eq!(keywords, vec!["fix", "api", "bug", "the", "layer"]);
    }
}
