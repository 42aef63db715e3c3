//! Retried calls against a mock provider

use llm_nexus::cache::CacheConfig;
use llm_nexus::{Payload, RetryOverrides};
use serde_json::json;

use crate::integration::mock_server::MockServerFixture;

fn hi() -> Payload {
    Payload::from_value(json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap()
}

#[tokio::test]
async fn test_rate_limited_call_retried_then_returned() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect(
            "/v1/chat/completions",
            429,
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
            3,
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let overrides = RetryOverrides::new().max_retries(2);
    let err = client
        .chat_with_retry(hi(), "chat/completions", true, Some(&overrides))
        .await
        .unwrap_err();
    mock.assert_async().await;
    assert_eq!(err.tag(), "rate_limit");
    assert!(err.to_string().contains("Rate limit reached"));
}

#[tokio::test]
async fn test_server_error_message_not_rewrapped() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 503, "busy", 2)
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let overrides = RetryOverrides::new().max_retries(1);
    let err = client
        .chat_with_retry(hi(), "chat/completions", true, Some(&overrides))
        .await
        .unwrap_err();
    mock.assert_async().await;
    assert_eq!(err.tag(), "server_error");
    assert_eq!(
        err.to_string(),
        "Network transport error: HTTP status 503: busy"
    );
}

#[tokio::test]
async fn test_rejected_request_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect(
            "/v1/chat/completions",
            400,
            r#"{"error":{"message":"messages is required","type":"invalid_request_error"}}"#,
            1,
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let err = client
        .chat_with_retry(hi(), "chat/completions", true, None)
        .await
        .unwrap_err();
    mock.assert_async().await;
    assert_eq!(err.tag(), "invalid_request");
}

#[tokio::test]
async fn test_successful_call_returns_result() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect(
            "/v1/chat/completions",
            200,
            r#"{"choices":[{"message":{"content":"hello"}}],"usage":{"total_tokens":5}}"#,
            1,
        )
        .await;
    let client = fixture.client("deepseek", CacheConfig::new());

    let result = client
        .chat_with_retry(hi(), "chat/completions", true, None)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(result.content, "hello");
    assert_eq!(result.usage["total_tokens"], 5);
    assert_eq!(result.usage["prompt_tokens"], 0);
}
