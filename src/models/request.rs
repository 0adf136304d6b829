//! Normalized chat request.
//!
//! The same structure is accepted on the HTTP surface, handed to every
//! provider, and hashed into the response cache key.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// Author of a single chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Provider-agnostic chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Upstream model identifier. Empty means "use the provider default".
    #[serde(default)]
    pub model: String,

    /// Ordered conversation turns.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature. Omitted from the upstream payload when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Maximum number of completion tokens.
    /// Default: `1024`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Skip the cache read for this request. The result is still written back.
    #[serde(default)]
    pub fresh: bool,

    /// System prompt, sent the way each provider expects it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: default_max_tokens(),
            fresh: false,
            system: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }
}

fn default_max_tokens() -> u32 {
    1024
}
