// Cache key derivation
// Author: kelexine (https://github.com/kelexine)

use crate::models::{ChatMessage, ChatRequest};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Every request field that changes what the provider would answer.
/// `fresh` is deliberately absent.
#[derive(Serialize)]
struct KeyMaterial<'a> {
    provider: &'a str,
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: Option<f64>,
    max_tokens: u32,
    system: Option<&'a str>,
}

/// Generate the SHA-256 cache key for a request sent to `provider`.
pub fn cache_key(provider: &str, request: &ChatRequest) -> String {
    let material = KeyMaterial {
        provider,
        model: &request.model,
        messages: &request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        system: request.system.as_deref(),
    };

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&material).unwrap_or_default());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest::new("gpt-4o", vec![ChatMessage::user("Hello")])
            .with_temperature(0.7)
            .with_max_tokens(256)
            .with_system("You are terse.")
    }

    #[test]
    fn test_same_request_same_key() {
        assert_eq!(cache_key("openai", &request()), cache_key("openai", &request()));
        assert_eq!(cache_key("openai", &request()).len(), 64);
    }

    #[test]
    fn test_fresh_does_not_change_key() {
        let stale = request();
        let fresh = request().fresh(true);
        assert_eq!(cache_key("openai", &stale), cache_key("openai", &fresh));
    }

    #[test]
    fn test_relevant_fields_change_key() {
        let base = cache_key("openai", &request());

        let mut other_model = request();
        other_model.model = "gpt-4o-mini".to_string();
        assert_ne!(base, cache_key("openai", &other_model));

        assert_ne!(base, cache_key("openai", &request().with_temperature(0.2)));
        assert_ne!(base, cache_key("openai", &request().with_max_tokens(512)));
        assert_ne!(base, cache_key("openai", &request().with_system("Be verbose.")));

        let mut no_system = request();
        no_system.system = None;
        assert_ne!(base, cache_key("openai", &no_system));

        let mut more_messages = request();
        more_messages.messages.push(ChatMessage::assistant("Hi"));
        assert_ne!(base, cache_key("openai", &more_messages));

        assert_ne!(base, cache_key("anthropic", &request()));
    }

    #[test]
    fn test_message_order_matters() {
        let a = ChatRequest::new(
            "gpt-4o",
            vec![ChatMessage::user("one"), ChatMessage::user("two")],
        );
        let b = ChatRequest::new(
            "gpt-4o",
            vec![ChatMessage::user("two"), ChatMessage::user("one")],
        );
        assert_ne!(cache_key("openai", &a), cache_key("openai", &b));
    }
}
