// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    REQUESTS_TOTAL,
    UPSTREAM_CALLS,
    UPSTREAM_DURATION,
    TOKENS_TOTAL,
    CACHE_OPERATIONS,
    QUOTA_DECISIONS,
};

/// Helper to record request metrics
pub fn record_request(endpoint: &str, status_code: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[endpoint, &status_code.to_string()])
        .inc();
}

/// Helper to record provider call metrics
pub fn record_upstream_call(provider: &str, success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "failure" };
    UPSTREAM_CALLS.with_label_values(&[provider, outcome]).inc();
    UPSTREAM_DURATION
        .with_label_values(&[provider])
        .observe(duration_secs);
}

/// Helper to record token usage
pub fn record_tokens(model: &str, prompt: u32, completion: u32) {
    if prompt > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model, "prompt"])
            .inc_by(prompt as f64);
    }
    if completion > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model, "completion"])
            .inc_by(completion as f64);
    }
}

/// Helpers to record response cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_write(success: bool) {
    let operation = if success { "write" } else { "write_error" };
    CACHE_OPERATIONS.with_label_values(&[operation]).inc();
}

/// Helper to record quota outcomes
pub fn record_quota(decision: &str) {
    QUOTA_DECISIONS.with_label_values(&[decision]).inc();
}
