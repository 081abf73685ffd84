//! Service entry point

use anyhow::Context;
use directive_ranker::api::{build_router, AppState};
use directive_ranker::budget::TokenBudgetAllocator;
use directive_ranker::config::AppConfig;
use directive_ranker::detection::{
    ContextDetectionEngine, HttpModelProvider, ModelProvider, RuleBasedDetector, Vocabulary,
};
use directive_ranker::directives::{DirectiveStore, InMemoryDirectiveStore};
use directive_ranker::query::QueryOrchestrator;
use directive_ranker::ranking::RankingEngine;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Invalid configuration is fatal before any query runs
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    let providers = build_providers(&config).await?;
    let vocabulary = Arc::new(Vocabulary::builtin());
    let detection = Arc::new(ContextDetectionEngine::new(
        providers,
        RuleBasedDetector::new(Vocabulary::builtin()),
        config.detection.engine_config(),
    ));

    let ranking_config = Arc::new(config.ranking.clone());
    let orchestrator = Arc::new(QueryOrchestrator::new(
        detection,
        RankingEngine::new(vocabulary, ranking_config.clone()),
        TokenBudgetAllocator::char_based(&ranking_config.token_estimation),
        config.query.clone(),
    ));

    let store = build_store(&config).await?;
    info!("Directive store ready ({} directives)", store.len().await?);

    let state = AppState {
        orchestrator,
        store,
        started_at: chrono::Utc::now(),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Build the provider chain in priority order and probe reachability
async fn build_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn ModelProvider>>> {
    let mut providers: Vec<Arc<dyn ModelProvider>> = Vec::new();
    for settings in &config.providers {
        let provider = HttpModelProvider::new(settings.provider_config())
            .map_err(|e| anyhow::anyhow!("Provider '{}': {}", settings.name, e))?;
        providers.push(Arc::new(provider));
    }

    if providers.is_empty() {
        info!("No model providers configured; detection is rule-based only");
        return Ok(providers);
    }

    let probes = providers
        .iter()
        .map(|p| async move { (p.name().to_string(), p.is_available().await) });
    for (name, available) in futures::future::join_all(probes).await {
        if available {
            info!("Provider '{}' configured and reachable", name);
        } else {
            warn!("Provider '{}' configured but unavailable", name);
        }
    }

    Ok(providers)
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DirectiveStore>> {
    let store = match &config.store.directives_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read directives from {}", path))?;
            InMemoryDirectiveStore::from_json(&raw)?
        }
        None => {
            warn!("No directives_path configured; starting with an empty store");
            InMemoryDirectiveStore::new(Vec::new())?
        }
    };
    Ok(Arc::new(store))
}
