//! Completion and gateway response types.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Normalized provider output. This is also the payload persisted in the
/// response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Response returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Served from the response cache without an upstream call.
    pub from_cache: bool,
    /// Remaining quota after this call. `None` means quota was not touched.
    pub tries_remaining: Option<u32>,
}

impl ChatResponse {
    pub fn from_completion(completion: Completion, from_cache: bool) -> Self {
        Self {
            content: completion.content,
            model: completion.model,
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            from_cache,
            tries_remaining: None,
        }
    }

    pub fn with_tries_remaining(mut self, tries_remaining: Option<u32>) -> Self {
        self.tries_remaining = tries_remaining;
        self
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// JSON body served on the HTTP surface. `tries_remaining` is left out
    /// entirely when quota was not consumed.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "content": self.content,
            "model": self.model,
            "prompt_tokens": self.prompt_tokens,
            "completion_tokens": self.completion_tokens,
            "total_tokens": self.total_tokens(),
            "from_cache": self.from_cache,
        });

        if let (Some(remaining), Some(map)) = (self.tries_remaining, body.as_object_mut()) {
            map.insert("tries_remaining".to_string(), json!(remaining));
        }

        body
    }
}
