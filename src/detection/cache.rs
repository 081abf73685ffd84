//! TTL cache for detection results
//!
//! Caches full detection outcomes so a burst of identical queries hits the
//! provider chain once. Keys combine a hash of the task text with the
//! keyword flag, since a keyword-less entry must never answer a
//! keyword-bearing request.

use super::models::TaskContext;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Configuration for the detection cache
#[derive(Debug, Clone)]
pub struct DetectionCacheConfig {
    pub ttl: Duration,
    pub max_entries: u64,
}

impl Default for DetectionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 1000,
        }
    }
}

/// TTL cache over detection outcomes
pub struct DetectionCache {
    entries: Cache<String, TaskContext>,
}

impl DetectionCache {
    pub fn new(config: DetectionCacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { entries }
    }

    fn key(text: &str, with_keywords: bool) -> String {
        use std::fmt::Write;
        let digest = Sha256::digest(text.as_bytes());
        let mut key = digest.iter().fold(String::with_capacity(66), |mut acc, b| {
            let _ = write!(acc, "{:02x}", b);
            acc
        });
        key.push(if with_keywords { ':' } else { '.' });
        key
    }

    pub async fn get(&self, text: &str, with_keywords: bool) -> Option<TaskContext> {
        self.entries.get(&Self::key(text, with_keywords)).await
    }

    pub async fn store(&self, text: &str, with_keywords: bool, context: TaskContext) {
        self.entries
            .insert(Self::key(text, with_keywords), context)
            .await;
    }

    /// Number of cached entries (approximate under concurrency)
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }
}
