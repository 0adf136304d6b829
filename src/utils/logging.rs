//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the gateway,
//! supporting multiple output formats and providing a helper that keeps
//! provider API keys out of log sinks.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{GatewayError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the gateway.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Multi-line, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| GatewayError::Internal(format!("Failed to install logger: {}", e)))
}

/// Sanitizes provider API keys out of log messages.
///
/// OpenAI (`sk-...`, `sk-proj-...`) and Anthropic (`sk-ant-...`) keys share the
/// `sk-` prefix. Every occurrence is replaced with `[REDACTED_API_KEY]` up to
/// the next whitespace or quote.
pub fn sanitize(input: &str) -> String {
    const PREFIX: &str = "sk-";
    const REDACTED: &str = "[REDACTED_API_KEY]";

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(PREFIX) {
        result.push_str(&rest[..pos]);
        let token = &rest[pos..];
        let end = token
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(token.len());
        result.push_str(REDACTED);
        rest = &token[end..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_openai_key() {
        let input = "Authorization: Bearer sk-proj-abc123XYZ";
        let output = sanitize(input);
        assert_eq!(output, "Authorization: Bearer [REDACTED_API_KEY]");
    }

    #[test]
    fn test_sanitize_every_occurrence() {
        let input = r#"{"key":"sk-ant-api03-aaa","other":"sk-bbb"}"#;
        let output = sanitize(input);
        assert!(!output.contains("sk-ant-api03-aaa"));
        assert!(!output.contains("sk-bbb"));
        assert_eq!(output.matches("[REDACTED_API_KEY]").count(), 2);
    }

    #[test]
    fn test_sanitize_leaves_clean_text_alone() {
        assert_eq!(sanitize("invalid model: gpt-4o"), "invalid model: gpt-4o");
    }
}
