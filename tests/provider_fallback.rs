//! Provider fallback chain tests against mock HTTP endpoints

use directive_ranker::detection::{
    ContextDetectionEngine, DetectOptions, DetectionEngineConfig, HttpModelProvider,
    HttpProviderConfig, ModelProvider, RuleBasedDetector, Vocabulary,
};
use std::sync::Arc;
use std::time::Duration;

fn provider_config(name: &str, endpoint: String) -> HttpProviderConfig {
    HttpProviderConfig {
        name: name.to_string(),
        endpoint,
        api_key: None,
        model: "test-model".to_string(),
        timeout: Duration::from_secs(2),
        max_retries: 0,
        retry_backoff: Duration::from_millis(10),
    }
}

fn engine(providers: Vec<Arc<dyn ModelProvider>>) -> ContextDetectionEngine {
    ContextDetectionEngine::new(
        providers,
        RuleBasedDetector::new(Vocabulary::builtin()),
        DetectionEngineConfig {
            provider_timeout: Duration::from_secs(3),
            cache: None,
        },
    )
}

fn completion_body(context_json: &str) -> String {
    serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": context_json,
            }
        }]
    })
    .to_string()
}

#[tokio::test]
async fn primary_provider_answers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            r#"{"layer": "2-application", "topics": ["security"], "confidence": 0.85}"#,
        ))
        .create_async()
        .await;

    let provider = HttpModelProvider::new(provider_config(
        "primary",
        format!("{}/v1/chat/completions", server.url()),
    ))
    .unwrap();

    let context = engine(vec![Arc::new(provider)])
        .detect_context("Secure the api", DetectOptions::default())
        .await;

    mock.assert_async().await;
    assert_eq!(context.layer, "2-application");
    assert_eq!(context.confidence, 0.85);
    assert!(!context.diagnostics.fallback_used);
    assert_eq!(context.diagnostics.model_provider.as_deref(), Some("primary"));
}

#[tokio::test]
async fn failing_primary_falls_through_to_secondary() {
    let mut primary_server = mockito::Server::new_async().await;
    primary_server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let mut secondary_server = mockito::Server::new_async().await;
    secondary_server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(r#"{"layer": "3-domain", "confidence": 0.6}"#))
        .create_async()
        .await;

    let primary = HttpModelProvider::new(provider_config(
        "primary",
        format!("{}/v1/chat/completions", primary_server.url()),
    ))
    .unwrap();
    let secondary = HttpModelProvider::new(provider_config(
        "secondary",
        format!("{}/v1/chat/completions", secondary_server.url()),
    ))
    .unwrap();

    let engine = engine(vec![Arc::new(primary), Arc::new(secondary)]);
    let context = engine.detect_context("task", DetectOptions::default()).await;

    assert_eq!(context.layer, "3-domain");
    assert_eq!(
        context.diagnostics.model_provider.as_deref(),
        Some("secondary")
    );
    assert!(!context.diagnostics.fallback_used);
    assert_eq!(engine.failure_count("primary"), 1);
}

#[tokio::test]
async fn all_providers_rejecting_uses_rule_based_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .expect_at_least(2)
        .create_async()
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.url());
    let primary = HttpModelProvider::new(provider_config("primary", endpoint.clone())).unwrap();
    let secondary = HttpModelProvider::new(provider_config("secondary", endpoint)).unwrap();

    let context = engine(vec![Arc::new(primary), Arc::new(secondary)])
        .detect_context(
            "Create a React component with CSS styling",
            DetectOptions::default(),
        )
        .await;

    assert!(context.diagnostics.fallback_used);
    assert!(context.diagnostics.model_provider.is_none());
    // Rule-based detection still classifies the task
    assert_eq!(context.layer, "1-presentation");
    assert!(context.confidence > 0.3);
}

#[tokio::test]
async fn malformed_provider_json_triggers_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("this is not json at all"))
        .create_async()
        .await;

    let provider = HttpModelProvider::new(provider_config(
        "primary",
        format!("{}/v1/chat/completions", server.url()),
    ))
    .unwrap();

    let context = engine(vec![Arc::new(provider)])
        .detect_context("Write a SQL migration", DetectOptions::default())
        .await;

    assert!(context.diagnostics.fallback_used);
    assert_eq!(context.layer, "4-persistence");
}

#[tokio::test]
async fn code_fenced_json_is_accepted() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            "```json\n{\"layer\": \"5-infrastructure\", \"confidence\": 0.7}\n```",
        ))
        .create_async()
        .await;

    let provider = HttpModelProvider::new(provider_config(
        "primary",
        format!("{}/v1/chat/completions", server.url()),
    ))
    .unwrap();

    let context = engine(vec![Arc::new(provider)])
        .detect_context("Deploy the service", DetectOptions::default())
        .await;

    assert_eq!(context.layer, "5-infrastructure");
    assert!(!context.diagnostics.fallback_used);
}

#[tokio::test]
async fn provider_retries_before_giving_up() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let mut config = provider_config(
        "primary",
        format!("{}/v1/chat/completions", server.url()),
    );
    config.max_retries = 2;
    let provider = HttpModelProvider::new(config).unwrap();

    let result = provider.detect_context("task").await;
    assert!(result.is_err());
    mock.assert_async().await;
}
