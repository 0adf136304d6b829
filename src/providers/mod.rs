//! Upstream chat providers.
//!
//! The gateway only sees the [`Provider`] trait: a normalized [`ChatRequest`]
//! goes in, a normalized [`Completion`] comes out. Each submodule translates
//! to and from one vendor's wire format.
//!
//! - `openai`: OpenAI Chat Completions API.
//! - `anthropic`: Anthropic Messages API.
//! - `models`: known model identifiers and public endpoints.
//! - `transport`: shared HTTP client and retrying JSON POST.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod anthropic;
pub mod models;
pub mod openai;
mod transport;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{GatewayError, Result};
use crate::models::{ChatRequest, Completion};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// A chat completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name, part of every cache key.
    fn name(&self) -> &str;

    /// Send one request upstream. Failures are reported as
    /// [`GatewayError::Upstream`].
    async fn chat(&self, request: &ChatRequest) -> Result<Completion>;
}

/// Build the provider selected by `config`.
pub fn build(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    if config.api_key.trim().is_empty() {
        return Err(GatewayError::Config(format!(
            "provider.api_key is required for {}",
            config.kind.as_str()
        )));
    }

    info!(
        "Using {} provider at {}",
        config.kind.as_str(),
        config.base_url()
    );

    let provider: Arc<dyn Provider> = match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config)?),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_api_key() {
        let config = ProviderConfig::default();
        assert!(matches!(build(&config), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_build_selects_kind() {
        let mut config = ProviderConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        assert_eq!(build(&config).unwrap().name(), "openai");

        config.kind = ProviderKind::Anthropic;
        assert_eq!(build(&config).unwrap().name(), "anthropic");
    }
}
