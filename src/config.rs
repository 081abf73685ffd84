//! Service configuration
//!
//! Layered loading: optional TOML files, then `RANKER_*` environment
//! overrides. Validation runs at load time and is fatal; an invalid
//! ranking config never reaches the query path.

use crate::detection::{DetectionCacheConfig, DetectionEngineConfig, HttpProviderConfig};
use crate::error::{RankerError, Result};
use crate::query::QueryConfig;
use crate::ranking::RankingConfig;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Model providers in priority order; first entry is the primary
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Detection engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Ceiling for a single provider call in milliseconds
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: u64,
}

fn default_provider_timeout_ms() -> u64 {
    5000
}
fn default_cache_enabled() -> bool {
    true
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_cache_max_entries() -> u64 {
    1000
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout_ms(),
            cache_enabled: default_cache_enabled(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl DetectionConfig {
    pub fn engine_config(&self) -> DetectionEngineConfig {
        DetectionEngineConfig {
            provider_timeout: Duration::from_millis(self.provider_timeout_ms),
            cache: self.cache_enabled.then(|| DetectionCacheConfig {
                ttl: Duration::from_secs(self.cache_ttl_secs),
                max_entries: self.cache_max_entries,
            }),
        }
    }
}

/// One model provider in the fallback chain
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token for the endpoint
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> usize {
    2
}
fn default_retry_backoff_ms() -> u64 {
    100
}

impl ProviderSettings {
    pub fn provider_config(&self) -> HttpProviderConfig {
        HttpProviderConfig {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone().map(SecretString::new),
            model: self.model.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Directive source for the in-memory store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file with the ingested directive records
    #[serde(default)]
    pub directives_path: Option<String>,
}

impl AppConfig {
    /// Load from optional TOML files and `RANKER_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("RANKER").separator("__"))
            .build()
            .map_err(|e| RankerError::Configuration(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| RankerError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string; used by tests and tooling
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .map_err(|e| RankerError::Configuration(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| RankerError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Fatal-at-startup validation
    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;

        if self.detection.provider_timeout_ms == 0 {
            return Err(RankerError::Configuration(
                "detection.provider_timeout_ms must be positive".to_string(),
            ));
        }
        if self.query.default_token_budget == 0 {
            return Err(RankerError::Configuration(
                "query.default_token_budget must be positive".to_string(),
            ));
        }

        for provider in &self.providers {
            if provider.name.is_empty() {
                return Err(RankerError::Configuration(
                    "Provider name cannot be empty".to_string(),
                ));
            }
            if provider.endpoint.is_empty() {
                return Err(RankerError::Configuration(format!(
                    "Provider '{}' has an empty endpoint",
                    provider.name
                )));
            }
        }

        Ok(())
    }
}
