// Shared HTTP transport for providers
// Author: kelexine (https://github.com/kelexine)

use crate::error::{GatewayError, Result};
use crate::utils::logging::sanitize;
use crate::utils::retry::{parse_retry_after, with_retry, AttemptFailure};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Configure an HTTP client with pooling and the provider timeout
pub(crate) fn build_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .build()
        .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// POST `body` as JSON and decode the JSON response.
///
/// 429/5xx and transport failures are retried up to `max_retries` times;
/// whatever is left over comes back as [`GatewayError::Upstream`].
pub(crate) async fn post_json<B, T>(
    client: &Client,
    provider: &str,
    url: &str,
    headers: HeaderMap,
    body: &B,
    max_retries: u32,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    debug!("POST {} ({})", url, provider);

    let response_text = with_retry(provider, max_retries, || {
        let request = client.post(url).headers(headers.clone()).json(body);
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| AttemptFailure::new(e.status().map_or(0, |s| s.as_u16()), e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                let error_text = response.text().await.unwrap_or_default();
                let message = extract_error_message(&error_text).unwrap_or(error_text);
                return Err(AttemptFailure::new(status.as_u16(), message).with_retry_after(retry_after));
            }

            response
                .text()
                .await
                .map_err(|e| AttemptFailure::new(0, format!("Failed to read response body: {}", e)))
        }
    })
    .await
    .map_err(|failure| {
        error!(
            "{} API error: HTTP {} - {}",
            provider,
            failure.status,
            sanitize(&failure.message)
        );
        let status = (failure.status != 0).then_some(failure.status);
        let message = match status {
            Some(code) => format!("{} returned HTTP {}: {}", provider, code, failure.message),
            None => format!("{} request failed: {}", provider, failure.message),
        };
        GatewayError::upstream(message, status)
    })?;

    serde_json::from_str(&response_text).map_err(|e| {
        error!("Failed to parse {} response: {}", provider, e);
        GatewayError::Upstream {
            message: format!("{} response parsing error: {}", provider, e),
            status: None,
            source: Some(Box::new(e)),
        }
    })
}

/// Extract `error.message` from an OpenAI- or Anthropic-style error body
fn extract_error_message(response_text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        #[serde(rename = "type")]
        error_type: Option<String>,
    }

    let error = serde_json::from_str::<ErrorResponse>(response_text).ok()?.error?;
    error.message.or(error.error_type)
}
