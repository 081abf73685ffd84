//! Token estimation strategies

use crate::error::RankerError;
use crate::ranking::TokenEstimationConfig;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Token estimator trait for different tokenization strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens one directive costs in the output
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }
}

/// Character-count estimator: `ceil(chars / avg_chars_per_token) + overhead`
///
/// Deterministic and monotonic in text length, which is what the budget
/// allocator's invariants require. This is the default estimator.
pub struct CharBasedEstimator {
    avg_chars_per_token: f64,
    overhead_tokens: usize,
}

impl CharBasedEstimator {
    pub fn new(config: &TokenEstimationConfig) -> Self {
        Self {
            avg_chars_per_token: config.avg_chars_per_token,
            overhead_tokens: config.overhead_tokens,
        }
    }
}

impl Default for CharBasedEstimator {
    fn default() -> Self {
        Self::new(&TokenEstimationConfig::default())
    }
}

impl TokenEstimator for CharBasedEstimator {
    fn estimate(&self, text: &str) -> usize {
        let chars = text.chars().count();
        (chars as f64 / self.avg_chars_per_token).ceil() as usize + self.overhead_tokens
    }
}

/// Tiktoken-based estimator using cl100k_base
///
/// Closer to real model counts, at the cost of the strict length
/// monotonicity the char-based estimator guarantees.
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
    overhead_tokens: usize,
}

impl TiktokenEstimator {
    pub fn new(overhead_tokens: usize) -> Result<Self, RankerError> {
        let bpe = cl100k_base()
            .map_err(|e| RankerError::Internal(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self {
            bpe: Arc::new(bpe),
            overhead_tokens,
        })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len() + self.overhead_tokens
    }
}
