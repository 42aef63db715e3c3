//! Cache behavior shared across clients

use llm_nexus::cache::{CacheConfig, CacheManager, TierSettings};
use llm_nexus::{Message, Payload};
use std::sync::Arc;

use crate::integration::mock_server::MockServerFixture;

const HELLO: &str = r#"{"choices":[{"message":{"content":"hello"}}],"usage":{"total_tokens":5}}"#;

/// Payload as the OpenAI client sends it, with the default model filled in.
fn openai_payload(payload: &Payload) -> Payload {
    payload.clone().with_model("gpt-4o-mini-2024-07-18")
}

#[tokio::test]
async fn test_shared_cache_is_keyed_by_provider() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 2)
        .await;
    let cache = Arc::new(CacheManager::in_memory(
        CacheConfig::new().with_statistics(true),
    ));
    let openai = fixture.client_with_cache("openai", cache.clone());
    let deepseek = fixture.client_with_cache("deepseek", cache.clone());

    let payload = Payload::with_messages([Message::user("hi")]).with_model("shared-model");
    openai.chat(payload.clone(), "chat/completions", true).await;
    deepseek.chat(payload.clone(), "chat/completions", true).await;
    openai.chat(payload.clone(), "chat/completions", true).await;
    deepseek.chat(payload, "chat/completions", true).await;
    mock.assert_async().await;

    let stats = cache.statistics().await;
    assert_eq!(stats.total, 4);
    assert_eq!(stats.hit_rate, 50.0);
    assert_eq!(stats.providers["openai"].hits, 1);
    assert_eq!(stats.providers["deepseek"].misses, 1);
}

#[tokio::test]
async fn test_provider_disable_and_clear() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expect("/v1/chat/completions", 200, HELLO, 4)
        .await;
    let cache = Arc::new(CacheManager::in_memory(
        CacheConfig::new()
            .with_statistics(true)
            .with_provider("DeepSeek", TierSettings::enabled(false)),
    ));
    let openai = fixture.client_with_cache("openai", cache.clone());
    let deepseek = fixture.client_with_cache("deepseek", cache.clone());
    let payload = Payload::with_messages([Message::user("hi")]);

    // caching is off for DeepSeek: both calls reach the server
    deepseek.chat(payload.clone(), "chat/completions", true).await;
    deepseek.chat(payload.clone(), "chat/completions", true).await;

    openai.chat(payload.clone(), "chat/completions", true).await;
    assert!(cache.is_cached(&openai_payload(&payload), "chat/completions", "OpenAI").await);
    assert!(cache.clear_cache().await);
    assert!(!cache.is_cached(&openai_payload(&payload), "chat/completions", "OpenAI").await);
    openai.chat(payload, "chat/completions", true).await;
    mock.assert_async().await;

    let stats = cache.statistics().await;
    assert!(stats.last_clear.is_some());
    assert!(!stats.providers.contains_key("deepseek"));
}
