//! Non-streaming calls against a mock provider

use llm_nexus::cache::{CacheConfig, TierSettings};
use llm_nexus::provider::OpenAiAdapter;
use llm_nexus::{ChatResult, Message, Payload, ProviderClient, Usage};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

use crate::integration::mock_server::MockServerFixture;

const HELLO: &str = r#"{"choices":[{"message":{"content":"hello"}}],"usage":{"total_tokens":5}}"#;

fn hi() -> Payload {
    Payload::from_value(json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap()
}

#[tokio::test]
async fn test_chat_success_scenario() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 1)
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let result = client.chat(hi(), "chat/completions", true).await;
    mock.assert_async().await;

    assert!(result.success);
    assert_eq!(result.content, "hello");
    let mut usage = Usage::new();
    usage.insert("total_tokens".into(), 5);
    assert_eq!(result.usage, usage);
    assert_eq!(result.provider, "OpenAI");
    assert_eq!(result.model, "gpt-4o-mini-2024-07-18");
    assert!(result.error.is_none());
    assert!(result.raw.is_some());
}

#[tokio::test]
async fn test_request_carries_auth_and_default_model() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_header("content-type", Matcher::Regex("application/json".into()))
        .match_body(Matcher::PartialJson(json!({"model": "gpt-4o-mini-2024-07-18"})))
        .with_status(200)
        .with_body(HELLO)
        .create_async()
        .await;
    let client = fixture.client("openai", CacheConfig::new().with_enabled(false));

    assert!(client.chat(hi(), "chat/completions", false).await.success);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_claude_headers_and_max_tokens() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({"max_tokens": 1024})))
        .with_status(200)
        .with_body(r#"{"content":[{"type":"text","text":" hey "}],"usage":{"input_tokens":3,"output_tokens":1}}"#)
        .create_async()
        .await;
    let client = fixture.client("claude", CacheConfig::new());

    let result = client.chat(hi(), client.default_endpoint(), true).await;
    mock.assert_async().await;
    assert_eq!(result.content, "hey");
    assert_eq!(result.usage["input_tokens"], 3);
    assert_eq!(result.usage["output_tokens"], 1);
}

#[tokio::test]
async fn test_prepopulated_cache_skips_transport() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 0)
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let payload = hi().with_model(client.model());
    let stored = ChatResult::success("from cache", Usage::new(), "OpenAI", client.model(), json!({}));
    assert!(
        client
            .cache()
            .cache_response(&payload, "chat/completions", "OpenAI", &stored, None)
            .await
    );

    let result = client.chat(hi(), "chat/completions", true).await;
    assert_eq!(result, stored);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_second_identical_call_is_served_from_cache() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 1)
        .await;
    let client = fixture.client("openai", CacheConfig::new().with_statistics(true));

    let first = client.chat(hi(), "chat/completions", true).await;
    let second = client.chat(hi(), "chat/completions", true).await;
    mock.assert_async().await;
    assert_eq!(first, second);

    let stats = client.cache().statistics().await;
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn test_stream_key_or_disabled_endpoint_bypasses_cache() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 4)
        .await;

    let disabled = fixture.client(
        "openai",
        CacheConfig::new().with_endpoint("chat/completions", TierSettings::enabled(false)),
    );
    assert!(!disabled
        .cache()
        .is_caching_enabled(Some("OpenAI"), Some("chat/completions")));
    assert!(disabled
        .cache()
        .is_caching_enabled(Some("OpenAI"), Some("other/endpoint")));
    disabled.chat(hi(), "chat/completions", true).await;
    disabled.chat(hi(), "chat/completions", true).await;

    let enabled = fixture.client("openai", CacheConfig::new());
    let mut streamed = hi();
    streamed.insert("stream", json!(false));
    enabled.chat(streamed.clone(), "chat/completions", true).await;
    enabled.chat(streamed, "chat/completions", true).await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_failures_become_results() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json_response(
            "/v1/chat/completions",
            200,
            r#"{"error":{"message":"bad model","type":"invalid_request_error"}}"#,
        )
        .await;
    fixture
        .mock_json_response("/v1/overloaded", 503, "upstream down")
        .await;
    fixture
        .mock_json_response("/v1/limited", 429, r#"{"error":{"message":"slow down"}}"#)
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let result = client.chat(hi(), "chat/completions", true).await;
    assert!(!result.success);
    assert_eq!(result.error_type.as_deref(), Some("invalid_request"));
    assert!(result.error.as_deref().unwrap_or_default().contains("bad model"));
    assert_eq!(result.content, "");
    assert!(result.usage.is_empty());
    // failures are never cached
    assert!(!client.cache().is_cached(&hi().with_model(client.model()), "chat/completions", "OpenAI").await);

    let result = client.chat(hi(), "overloaded", true).await;
    assert_eq!(result.error_type.as_deref(), Some("server_error"));

    let result = client.chat(hi(), "limited", true).await;
    assert_eq!(result.error_type.as_deref(), Some("rate_limit"));
    assert!(result.error.as_deref().unwrap_or_default().contains("slow down"));
}

#[tokio::test]
async fn test_precondition_failures() {
    let uninitialized = ProviderClient::with_defaults(Arc::new(OpenAiAdapter));
    let result = uninitialized.chat(hi(), "chat/completions", true).await;
    assert!(!result.success);
    assert_eq!(result.error_type.as_deref(), Some("not_initialized"));
    assert_eq!(result.provider, "OpenAI");

    let fixture = MockServerFixture::new().await;
    let client = fixture.client("openai", CacheConfig::new());
    let result = client.chat(hi(), "", true).await;
    assert_eq!(result.error_type.as_deref(), Some("invalid_argument"));
}

#[tokio::test]
async fn test_connection_refused_is_tagged() {
    let fixture = MockServerFixture::new().await;
    let mut client = fixture.client("deepseek", CacheConfig::new());
    client.set_base_url("http://127.0.0.1:1");
    client.initiate().unwrap();

    let payload = Payload::with_messages([Message::user("hi")]);
    let result = client.chat(payload, "chat/completions", true).await;
    assert!(!result.success);
    assert_eq!(result.error_type.as_deref(), Some("connection"));
}
