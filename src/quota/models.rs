//! Quota window record and limiter policy.

// Author: kelexine (https://github.com/kelexine)

use crate::config::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persisted counter for one (scope, identifier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaWindow {
    /// Requests consumed in the current window.
    pub count: u32,
    /// Unix seconds at which the current window opened.
    pub window_start: i64,
}

impl QuotaWindow {
    pub fn fresh(now: i64) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// The window as it stands at `now`: unchanged while it is open, a fresh
    /// window once `now > window_start + window_seconds`.
    pub fn rolled_over(self, now: i64, window_seconds: u64) -> Self {
        let length = i64::try_from(window_seconds).unwrap_or(i64::MAX);
        if now > self.window_start.saturating_add(length) {
            Self::fresh(now)
        } else {
            self
        }
    }
}

/// Limits applied by a quota counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Namespace separating independent quota pools.
    pub scope_id: String,
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
    /// Longest wait for a contended counter lock.
    pub lock_timeout: Duration,
}

impl QuotaPolicy {
    pub fn new(scope_id: impl Into<String>, max_requests: u32, window_seconds: u64) -> Self {
        Self {
            scope_id: scope_id.into(),
            max_requests,
            window_seconds,
            lock_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

impl From<&RateLimitConfig> for QuotaPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(
            config.rate_limit_id.clone(),
            config.max_requests,
            config.window_seconds,
        )
        .with_lock_timeout(Duration::from_millis(config.lock_timeout_ms))
    }
}
