//! Error taxonomy for the directive ranking pipeline

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, RankerError>;

/// Errors surfaced by the directive ranking service
///
/// Provider and detection failures are recovered inside the detection
/// engine and never reach callers; configuration errors are fatal at
/// load time, before any query runs.
#[derive(Debug, Error)]
pub enum RankerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Directive store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RankerError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
