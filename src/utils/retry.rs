// Retry logic for provider calls with Retry-After hint support
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;
use tracing::debug;

/// A failed upstream attempt as seen by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// HTTP status, or `0` when the request never produced one.
    pub status: u16,
    /// Provider error message or transport error text.
    pub message: String,
    /// Delay requested by the provider through `Retry-After`.
    pub retry_after: Option<Duration>,
}

impl AttemptFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

/// Parse a `Retry-After` header value given in delta-seconds ("1", "2.5").
/// Returns the duration capped at 60 seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let capped_seconds = seconds.min(60.0);
    Some(Duration::from_millis((capped_seconds * 1000.0) as u64))
}

/// Create exponential backoff configuration for retries
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),     // Start at 500ms
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,                        // Add jitter
        multiplier: 2.0,                                  // Double each time
        max_interval: Duration::from_secs(30),            // Cap at 30s
        max_elapsed_time: Some(Duration::from_secs(120)), // Give up after 2 minutes
        ..Default::default()
    }
}

/// Determine if an HTTP status code is retryable. `0` marks a transport
/// failure (connect error, timeout) and is retried as well.
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 0 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Execute an upstream operation, retrying retryable failures.
/// - Uses the provider's `Retry-After` hint if present
/// - Falls back to exponential backoff
/// - Makes at most `max_retries + 1` attempts
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T, AttemptFailure>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AttemptFailure>>,
{
    let mut backoff = create_backoff();
    let max_attempts = max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(failure) => {
                if !is_retryable(failure.status) || attempt >= max_attempts {
                    return Err(failure);
                }

                let delay = match failure.retry_after {
                    Some(hint) => {
                        debug!(
                            "{} failed with {} (attempt {}), provider asks to wait {}ms",
                            operation_name,
                            failure.status,
                            attempt,
                            hint.as_millis()
                        );
                        hint
                    }
                    None => {
                        let Some(backoff_delay) = backoff.next_backoff() else {
                            return Err(failure);
                        };
                        debug!(
                            "{} failed with {} (attempt {}), retrying after {}ms",
                            operation_name,
                            failure.status,
                            attempt,
                            backoff_delay.as_millis()
                        );
                        backoff_delay
                    }
                };

                tokio::time::sleep(delay).await;
            }
        }
    }
}
