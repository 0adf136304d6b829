// Anthropic Messages API provider
// Author: kelexine (https://github.com/kelexine)

use super::models::anthropic::API_VERSION;
use super::transport::{build_client, post_json};
use super::Provider;
use crate::config::ProviderConfig;
use crate::error::{GatewayError, Result};
use crate::models::{ChatMessage, ChatRequest, Completion, Role};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `POST /messages` request body
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<&'a ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl<'a> From<&'a ChatRequest> for MessagesRequest<'a> {
    /// The Messages API has no system role: the request's system prompt and
    /// any system-role turns are joined, in order, into the `system` field.
    fn from(request: &'a ChatRequest) -> Self {
        let (system_turns, messages): (Vec<&ChatMessage>, Vec<&ChatMessage>) = request
            .messages
            .iter()
            .partition(|message| message.role == Role::System);

        let system_parts: Vec<&str> = request
            .system
            .as_deref()
            .into_iter()
            .chain(system_turns.iter().map(|message| message.content.as_str()))
            .collect();

        Self {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        }
    }
}

/// `POST /messages` response body (only the fields we read)
#[derive(Debug, Default, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Usage,
}

/// Response content block. Only `text` blocks contribute to the completion.
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Normalize, concatenating every text block in order.
    pub fn into_completion(self, requested_model: &str) -> Completion {
        let content = self
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<String>();

        Completion {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            prompt_tokens: self.usage.input_tokens,
            completion_tokens: self.usage.output_tokens,
        }
    }
}

/// Client for the Anthropic Messages API.
pub struct AnthropicProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl AnthropicProvider {
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
        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| GatewayError::Config("provider.api_key contains invalid characters".to_string()))?;
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(API_VERSION),
        );
        Ok(headers)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Completion> {
        let url = format!("{}/messages", self.base_url);
        let payload = MessagesRequest::from(request);

        let response: MessagesResponse = post_json(
            &self.http_client,
            self.name(),
            &url,
            self.headers()?,
            &payload,
            self.max_retries,
        )
        .await?;

        debug!("Received Anthropic message for model: {}", request.model);
        Ok(response.into_completion(&request.model))
    }
}
