// OpenAI Chat Completions provider
// Author: kelexine (https://github.com/kelexine)

use super::transport::{build_client, post_json};
use super::Provider;
use crate::config::ProviderConfig;
use crate::error::{GatewayError, Result};
use crate::models::{ChatMessage, ChatRequest, Completion};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `POST /chat/completions` request body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub max_tokens: u32,
}

impl<'a> From<&'a ChatRequest> for ChatCompletionRequest<'a> {
    /// The system prompt travels as a leading `system` message.
    fn from(request: &'a ChatRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(request.messages.iter().cloned());

        Self {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// `POST /chat/completions` response body (only the fields we read)
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Normalize, falling back to the requested model and empty content.
    pub fn into_completion(self, requested_model: &str) -> Completion {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        Completion {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
        }
    }
}

/// Client for the OpenAI Chat Completions API.
pub struct OpenAiProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_client(config.timeout_seconds)?,
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| GatewayError::Config("provider.api_key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest::from(request);

        let response: ChatCompletionResponse = post_json(
            &self.http_client,
            self.name(),
            &url,
            self.headers()?,
            &payload,
            self.max_retries,
        )
        .await?;

        debug!("Received OpenAI completion for model: {}", request.model);
        Ok(response.into_completion(&request.model))
    }
}
