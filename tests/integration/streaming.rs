//! Integration tests for streaming responses

use llm_nexus::cache::CacheConfig;
use llm_nexus::provider::OpenAiAdapter;
use llm_nexus::{Message, Payload, ProviderClient, StreamEvent, StreamHandler, Usage};
use std::sync::{Arc, Mutex};

use crate::integration::mock_server::MockServerFixture;

fn hi() -> Payload {
    Payload::with_messages([Message::user("hi")])
}

#[derive(Default)]
struct Seen {
    chunks: Vec<String>,
    completed: Option<(String, Usage)>,
    errors: Vec<String>,
}

fn recording_handler() -> (StreamHandler, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let (a, b, c) = (seen.clone(), seen.clone(), seen.clone());
    let handler = StreamHandler::new()
        .on_chunk(move |chunk| a.lock().unwrap().chunks.push(chunk.text.clone()))
        .on_complete(move |content, usage| {
            b.lock().unwrap().completed = Some((content.to_string(), usage.clone()))
        })
        .on_error(move |err| c.lock().unwrap().errors.push(err.tag().to_string()));
    (handler, seen)
}

#[tokio::test]
async fn test_sse_streaming_response() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(
            "/v1/chat/completions",
            vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}",
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}",
                "data: {\"choices\":[],\"usage\":{\"total_tokens\":7}}",
                "data: [DONE]",
            ],
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let (mut handler, seen) = recording_handler();
    client.stream_chat(hi(), "chat/completions", &mut handler).await;
    mock.assert_async().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.chunks, vec!["Hel", "lo", ""]);
    let (content, usage) = seen.completed.clone().unwrap();
    assert_eq!(content, "Hello");
    assert_eq!(usage["total_tokens"], 7);
    assert!(seen.errors.is_empty());
    assert_eq!(handler.content(), "Hello");
}

#[tokio::test]
async fn test_non_2xx_fails_fast_through_handler() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json_response(
            "/v1/chat/completions",
            401,
            r#"{"error":{"message":"bad key","type":"authentication_error"}}"#,
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let (mut handler, seen) = recording_handler();
    client.stream_chat(hi(), "chat/completions", &mut handler).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.errors, vec!["authentication"]);
    assert!(seen.chunks.is_empty());
    assert!(seen.completed.is_none());
}

#[tokio::test]
async fn test_precondition_failures_reach_handler() {
    let client = ProviderClient::with_defaults(Arc::new(OpenAiAdapter));
    let (mut handler, seen) = recording_handler();
    client.stream_chat(hi(), "chat/completions", &mut handler).await;
    assert_eq!(seen.lock().unwrap().errors, vec!["not_initialized"]);

    let fixture = MockServerFixture::new().await;
    let client = fixture.client("openai", CacheConfig::new());
    let (mut handler, seen) = recording_handler();
    client.stream_chat(hi(), " ", &mut handler).await;
    assert_eq!(seen.lock().unwrap().errors, vec!["invalid_argument"]);
}

#[tokio::test]
async fn test_channel_handler_receives_ordered_events() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_sse_stream(
            "/v1/chat/completions",
            vec![
                "{\"choices\":[{\"delta\":{\"content\":\"a\"}}]}",
                "{\"choices\":[{\"delta\":{\"content\":\"b\"}}]}",
                "data: [DONE]",
            ],
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let (mut handler, mut rx) = StreamHandler::channel();
    client.stream_chat(hi(), "chat/completions", &mut handler).await;
    drop(handler);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], StreamEvent::Chunk(c) if c.text == "a" && c.provider == "OpenAI"));
    assert!(matches!(&events[1], StreamEvent::Chunk(c) if c.text == "b"));
    assert!(matches!(&events[2], StreamEvent::Complete { content, .. } if content == "ab"));
}

#[tokio::test]
async fn test_stream_retry_reports_final_failure_once() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 503, "busy", 3)
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let (mut handler, seen) = recording_handler();
    let overrides = llm_nexus::RetryOverrides::new().max_retries(2);
    let err = client
        .stream_chat_with_retry(hi(), "chat/completions", &mut handler, Some(&overrides))
        .await
        .unwrap_err();
    mock.assert_async().await;

    assert_eq!(err.tag(), "server_error");
    assert_eq!(seen.lock().unwrap().errors, vec!["server_error"]);
}

#[tokio::test]
async fn test_stream_retry_success_returns_usage() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_sse_stream(
            "/v1/chat/completions",
            vec!["{\"choices\":[{\"delta\":{\"content\":\"ok\"}}],\"usage\":{\"total_tokens\":2}}"],
        )
        .await;
    let client = fixture.client("openai", CacheConfig::new());

    let (mut handler, seen) = recording_handler();
    let usage = client
        .stream_chat_with_retry(hi(), "chat/completions", &mut handler, None)
        .await
        .unwrap();
    assert_eq!(usage["total_tokens"], 2);
    assert_eq!(handler.content(), "ok");
    assert_eq!(seen.lock().unwrap().completed.as_ref().map(|c| c.0.as_str()), Some("ok"));
}

#[tokio::test]
async fn test_facade_streams_through_configured_provider() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_sse_stream(
            "/v1/chat/completions",
            vec!["{\"choices\":[{\"delta\":{\"content\":\"deep\"}}],\"usage\":{\"total_tokens\":3}}"],
        )
        .await;

    let config = llm_nexus::NexusConfig::new()
        .with_default_client("deepseek")
        .with_provider(
            "deepseek",
            llm_nexus::ProviderSettings {
                api_key: Some("test-key".into()),
                base_url: Some(fixture.base_url.clone()),
                ..Default::default()
            },
        );
    let llm = llm_nexus::LlmClient::from_config(config).unwrap();
    assert_eq!(llm.client_name(), "DeepSeek");

    let (mut handler, seen) = recording_handler();
    let usage = llm
        .stream_chat_with_retry(hi(), "chat/completions", &mut handler, None)
        .await
        .unwrap();
    assert_eq!(usage["total_tokens"], 3);
    assert_eq!(usage["prompt_tokens"], 0);
    assert_eq!(seen.lock().unwrap().completed.as_ref().unwrap().0, "deep");
}
