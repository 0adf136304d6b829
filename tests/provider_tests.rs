// Provider integration tests against a mock HTTP server
// Author: kelexine (https://github.com/kelexine)

use mockito::Matcher;
use quotagate::config::{ProviderConfig, ProviderKind};
use quotagate::error::GatewayError;
use quotagate::models::{ChatMessage, ChatRequest};
use quotagate::providers::{self, AnthropicProvider, OpenAiProvider, Provider};
use serde_json::json;

fn config(kind: ProviderKind, base_url: String) -> ProviderConfig {
    ProviderConfig {
        kind,
        api_key: "test-key".to_string(),
        base_url: Some(base_url),
        default_model: None,
        timeout_seconds: 5,
        max_retries: 2,
    }
}

#[tokio::test]
async fn test_openai_chat_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hi"}
            ],
            "max_tokens": 64
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}],
                "usage": {"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = OpenAiProvider::new(&config(ProviderKind::OpenAi, server.url())).unwrap();
    let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hi")])
        .with_system("Be brief.")
        .with_max_tokens(64);

    let completion = provider.chat(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.content, "Hello!");
    assert_eq!(completion.model, "gpt-4o-mini-2024-07-18");
    assert_eq!(completion.prompt_tokens, 7);
    assert_eq!(completion.completion_tokens, 2);
}

#[tokio::test]
async fn test_openai_client_error_is_upstream_and_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = OpenAiProvider::new(&config(ProviderKind::OpenAi, server.url())).unwrap();
    let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hi")]);

    let err = provider.chat(&request).await.unwrap_err();

    mock.assert_async().await;
    match err {
        GatewayError::Upstream { message, status, .. } => {
            assert_eq!(status, Some(401));
            assert!(message.contains("Incorrect API key provided"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_malformed_body_is_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let provider = OpenAiProvider::new(&config(ProviderKind::OpenAi, server.url())).unwrap();
    let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hi")]);

    let err = provider.chat(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Upstream { status: None, .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_anthropic_chat_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-sonnet-4-5",
            "system": "Be brief.",
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "claude-sonnet-4-5-20250929",
                "content": [{"type": "text", "text": "Hello!"}],
                "usage": {"input_tokens": 11, "output_tokens": 3}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = AnthropicProvider::new(&config(ProviderKind::Anthropic, server.url())).unwrap();
    let request = ChatRequest::new("claude-sonnet-4-5", vec![ChatMessage::user("Hi")])
        .with_system("Be brief.");

    let completion = provider.chat(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.content, "Hello!");
    assert_eq!(completion.prompt_tokens, 11);
    assert_eq!(completion.completion_tokens, 3);
}

#[tokio::test]
async fn test_anthropic_error_type_used_when_message_missing() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/messages")
        .with_status(400)
        .with_body(r#"{"type":"error","error":{"type":"invalid_request_error"}}"#)
        .create_async()
        .await;

    let provider = AnthropicProvider::new(&config(ProviderKind::Anthropic, server.url())).unwrap();
    let request = ChatRequest::new("claude-sonnet-4-5", vec![ChatMessage::user("Hi")]);

    let err = provider.chat(&request).await.unwrap_err();
    assert!(err.to_string().contains("invalid_request_error"));
    assert_eq!(err.classify().0.as_u16(), 502);
}

#[tokio::test]
async fn test_build_honours_base_url_override() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
        .create_async()
        .await;

    // Trailing slash is trimmed
    let provider = providers::build(&config(ProviderKind::OpenAi, format!("{}/", server.url()))).unwrap();
    let completion = provider
        .chat(&ChatRequest::new("gpt-4o", vec![ChatMessage::user("Hi")]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.content, "ok");
    assert_eq!(completion.model, "gpt-4o");
}
