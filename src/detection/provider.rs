//! Model provider interface for context detection

use super::models::ProviderContext;
use async_trait::async_trait;
use thiserror::Error;

/// Provider-level errors
///
/// Recovered inside the detection engine via the fallback chain; never
/// surfaced to callers of `detect_context`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable")]
    Unavailable,

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Uniform capability interface for context-detection sources
///
/// Providers are arranged in an ordered chain; the engine short-circuits on
/// the first success and collects errors from the rest.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name recorded in diagnostics
    fn name(&self) -> &str;

    /// Cheap reachability check; a false here skips the provider without
    /// counting as a failure
    async fn is_available(&self) -> bool;

    /// Infer task context from free text
    async fn detect_context(&self, text: &str) -> Result<ProviderContext, ProviderError>;
}
