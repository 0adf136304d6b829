//! Configuration data structures for the quotagate gateway.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, logging, the upstream provider, the response cache and the
//! per-identifier rate limiter.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::providers::models::{anthropic, openai};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifetime of a cached response when none is configured (1 hour).
pub const DEFAULT_CACHE_TTL: u64 = 3600;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-identifier request quota settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Which upstream API the gateway forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => openai::API_BASE_URL,
            ProviderKind::Anthropic => anthropic::API_BASE_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => openai::GPT_4O_MINI,
            ProviderKind::Anthropic => anthropic::CLAUDE_SONNET_4_5,
        }
    }
}

/// Settings for the upstream provider connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API flavour (`openai` or `anthropic`).
    /// Default: `openai`
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key sent to the provider.
    #[serde(default)]
    pub api_key: String,

    /// Override for the provider's API base URL.
    /// Default: the provider's public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model used when a request does not name one.
    /// Default: a current model of the selected provider.
    #[serde(default)]
    pub default_model: Option<String>,

    /// Connection and request timeout in seconds.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of times to retry 429/5xx responses.
    /// Default: `2`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.kind.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn default_model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }
}

/// Settings for the file-backed response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one file per cached response.
    /// Default: `<user cache dir>/quotagate/cache`
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Lifetime of a cached response in seconds.
    /// Default: `3600` (1 hour)
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

/// Settings for the file-backed fixed-window rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether requests are counted against a quota.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one counter file per (scope, identifier).
    /// Default: `<user cache dir>/quotagate/ratelimit`
    #[serde(default = "default_rate_limit_path")]
    pub path: PathBuf,

    /// Scope separating independent quota pools that share identifiers.
    /// Default: `default`
    #[serde(default = "default_rate_limit_id")]
    pub rate_limit_id: String,

    /// Requests allowed per identifier per window.
    /// Default: `60`
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    /// Default: `3600` (1 hour)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Longest time a caller waits for a contended counter lock.
    /// Default: `5000`
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: String::new(),
            base_url: None,
            default_model: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_cache_path(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_rate_limit_path(),
            rate_limit_id: default_rate_limit_id(),
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotagate")
}

fn default_cache_path() -> PathBuf {
    data_dir().join("cache")
}

fn default_rate_limit_path() -> PathBuf {
    data_dir().join("ratelimit")
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL
}

fn default_rate_limit_id() -> String {
    "default".to_string()
}

fn default_max_requests() -> u32 {
    60
}

fn default_window_seconds() -> u64 {
    3600
}

fn default_lock_timeout_ms() -> u64 {
    5000
}
