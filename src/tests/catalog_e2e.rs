//! End-to-end fallback chain tests using wiremock.
//!
//! Each test builds a [`RegistryConfig`] pointing the API stage at a mock
//! server and, where needed, the snapshot stage and cache at temporary
//! directories, then loads through [`CatalogClient`] exactly as the binary
//! does.

use std::path::Path;

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{
    catalog::{QueryOptions, SizeTier, SourceTag},
    client::CatalogClient,
    config::RegistryConfig,
};

const MODELS_PATH: &str = "/api/v1/models";

fn upstream_models() -> Value {
    json!({
        "data": [
            {
                "id": "openai/gpt-4o",
                "name": "OpenAI: GPT-4o",
                "context_length": 128000,
                "pricing": { "prompt": "0.0000025", "completion": "0.00001" },
                "architecture": {
                    "input_modalities": ["text", "image"],
                    "output_modalities": ["text"]
                },
                "top_provider": { "context_length": 128000, "max_completion_tokens": 16384 }
            },
            {
                "id": "mistralai/mistral-small",
                "name": "Mistral Small",
                "context_length": 32000,
                "pricing": { "prompt": "0", "completion": "0" }
            },
            {
                "id": "acme/unknown-model",
                "context_length": 4096,
                "pricing": { "prompt": "0.000001", "completion": "0.000001" }
            }
        ]
    })
}

fn snapshot_models() -> Value {
    json!({
        "data": [
            {
                "id": "anthropic/claude-3-haiku",
                "name": "Anthropic: Claude 3 Haiku",
                "context_length": 200000,
                "pricing": { "prompt": "0.00000025", "completion": "0.00000125" }
            }
        ]
    })
}

/// Config with the API stage on `server`, plus optional snapshot file and
/// file cache directory.
fn config_for(server: &MockServer, snapshot: Option<&Path>, cache_dir: Option<&Path>) -> RegistryConfig {
    let mut toml = format!(
        r#"
[upstream]
api_url = "{}{MODELS_PATH}"
timeout_secs = 5
"#,
        server.uri()
    );
    if let Some(snapshot) = snapshot {
        toml.push_str(&format!("\n[snapshot]\npath = \"{}\"\n", snapshot.display()));
    }
    if let Some(cache_dir) = cache_dir {
        toml.push_str(&format!(
            "\n[cache]\ntype = \"file\"\npath = \"{}\"\n",
            cache_dir.display()
        ));
    }
    RegistryConfig::from_str(&toml).unwrap()
}

async fn mount_models(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_loads_from_live_api() {
    let server = MockServer::start().await;
    mount_models(&server, 200, upstream_models()).await;

    let client = CatalogClient::from_config(&config_for(&server, None, None)).unwrap();
    let registry = client.ensure_loaded().await;

    assert_eq!(registry.source(), SourceTag::Api);
    assert_eq!(registry.len(), 3);
    assert!(client.last_error().is_none());

    // Descending context order
    let ids: Vec<&str> = registry.models().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["openai/gpt-4o", "mistralai/mistral-small", "acme/unknown-model"]
    );

    let gpt = registry.get("openai/gpt-4o").unwrap();
    assert_eq!(gpt.pricing.prompt_per_million, 2.5);
    assert_eq!(gpt.pricing.completion_per_million, 10.0);
    assert_eq!(gpt.max_completion_tokens, 16384);
    assert_eq!(gpt.size_tier, SizeTier::Large);
    assert!(gpt.supports_images());

    let unknown = registry.get("acme/unknown-model").unwrap();
    assert_eq!(unknown.provider.id, "acme");
    assert_eq!(unknown.size_tier, SizeTier::Tiny);
}

#[tokio::test]
async fn test_api_failure_uses_snapshot_file() {
    let server = MockServer::start().await;
    mount_models(&server, 500, json!({ "error": "upstream down" })).await;

    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(&snapshot, snapshot_models().to_string()).unwrap();

    let client = CatalogClient::from_config(&config_for(&server, Some(&snapshot), None)).unwrap();
    let registry = client.ensure_loaded().await;

    assert_eq!(registry.source(), SourceTag::Snapshot);
    assert_eq!(registry.len(), 1);
    assert!(registry.get("anthropic/claude-3-haiku").is_some());

    let error = client.last_error().unwrap();
    assert!(error.contains("api stage failed"), "{error}");
}

#[tokio::test]
async fn test_bad_shape_falls_through_to_snapshot() {
    let server = MockServer::start().await;
    mount_models(&server, 200, json!({ "models": [] })).await;

    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(&snapshot, snapshot_models().to_string()).unwrap();

    let client = CatalogClient::from_config(&config_for(&server, Some(&snapshot), None)).unwrap();
    assert_eq!(client.ensure_loaded().await.source(), SourceTag::Snapshot);
}

#[tokio::test]
async fn test_all_sources_fail_uses_hardcoded_models() {
    let server = MockServer::start().await;
    mount_models(&server, 503, json!({})).await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.json");

    let client = CatalogClient::from_config(&config_for(&server, Some(&missing), None)).unwrap();
    let registry = client.ensure_loaded().await;

    assert_eq!(registry.source(), SourceTag::Fallback);
    assert!(!registry.is_empty());

    let error = client.last_error().unwrap();
    assert!(error.contains("api stage failed"), "{error}");
    assert!(error.contains("snapshot stage failed"), "{error}");

    // Lookups still work against degraded data
    assert!(client.find_model("gpt-4o").is_some());
    assert!(client.context_limit("anthropic/claude-3.5-sonnet").is_some());
}

#[tokio::test]
async fn test_disabled_api_uses_embedded_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_models()))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server, None, None);
    config.upstream.enabled = false;

    let client = CatalogClient::from_config(&config).unwrap();
    let registry = client.ensure_loaded().await;

    assert_eq!(registry.source(), SourceTag::Snapshot);
    assert!(registry.get("anthropic/claude-3.5-sonnet").is_some());
}

#[tokio::test]
async fn test_file_cache_shared_between_clients() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_models()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, None, Some(dir.path()));

    let first = CatalogClient::from_config(&config).unwrap();
    let loaded = first.ensure_loaded().await;
    assert_eq!(loaded.source(), SourceTag::Api);

    // A fresh client reads the persisted registry instead of calling the API
    let second = CatalogClient::from_config(&config).unwrap();
    let cached = second.ensure_loaded().await;
    assert_eq!(cached.source(), SourceTag::Api);
    assert_eq!(cached.metadata(), loaded.metadata());
    assert_eq!(cached.models(), loaded.models());
}

#[tokio::test]
async fn test_query_through_client() {
    let server = MockServer::start().await;
    mount_models(&server, 200, upstream_models()).await;

    let client = CatalogClient::from_config(&config_for(&server, None, None)).unwrap();
    client.ensure_loaded().await;

    let free = client.query(&QueryOptions::new().free(true));
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, "mistralai/mistral-small");

    let openai = client.query(&QueryOptions::new().provider("OpenAI"));
    assert_eq!(openai.len(), 1);

    let found = client.find_model("mistral-small").unwrap();
    assert_eq!(found.id, "mistralai/mistral-small");
}
