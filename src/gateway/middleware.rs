// Gateway middleware - quota gate, response cache and provider orchestration
// Author: kelexine (https://github.com/kelexine)

use crate::cache::{cache_key, ExpiringStore, FileStore};
use crate::config::{CacheConfig, RateLimitConfig, DEFAULT_CACHE_TTL};
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::models::{ChatRequest, ChatResponse, Completion};
use crate::providers::Provider;
use crate::quota::{FileQuotaCounter, QuotaCounter};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Composes an optional [`QuotaCounter`] and an optional [`ExpiringStore`]
/// around a [`Provider`].
pub struct GatewayMiddleware {
    provider: Arc<dyn Provider>,
    quota: Option<Arc<dyn QuotaCounter>>,
    store: Option<Arc<dyn ExpiringStore>>,
    cache_ttl: u64,
}

impl GatewayMiddleware {
    /// A gateway with neither quota nor cache: every call goes upstream.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            quota: None,
            store: None,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_quota(mut self, quota: Arc<dyn QuotaCounter>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ExpiringStore>, ttl_seconds: u64) -> Self {
        self.store = Some(store);
        self.cache_ttl = ttl_seconds;
        self
    }

    /// Build the file-backed quota counter and response cache that are
    /// enabled in the configuration.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        cache: &CacheConfig,
        rate_limit: &RateLimitConfig,
    ) -> Result<Self> {
        let mut gateway = Self::new(provider);

        if rate_limit.enabled {
            info!(
                "Rate limiting enabled: {} requests per {}s (scope={})",
                rate_limit.max_requests, rate_limit.window_seconds, rate_limit.rate_limit_id
            );
            gateway = gateway.with_quota(Arc::new(FileQuotaCounter::from_config(rate_limit)?));
        }

        if cache.enabled {
            info!(
                "Response cache enabled at {} (ttl={}s)",
                cache.path.display(),
                cache.ttl_seconds
            );
            gateway = gateway.with_store(Arc::new(FileStore::new(&cache.path)?), cache.ttl_seconds);
        }

        Ok(gateway)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn quota_enabled(&self) -> bool {
        self.quota.is_some()
    }

    pub fn cache_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Serve one request on behalf of `identifier`.
    ///
    /// Only [`GatewayError::QuotaExceeded`] and [`GatewayError::Upstream`] are
    /// ever returned. Storage problems while writing the cache or consuming
    /// quota are logged and absorbed; in the latter case `tries_remaining`
    /// stays `None`.
    pub async fn handle(&self, request: &ChatRequest, identifier: &str) -> Result<ChatResponse> {
        // 1. Gate on quota before touching the cache
        if let Some(quota) = &self.quota {
            if !quota.is_allowed(identifier) {
                info!("Quota exceeded for identifier: {}", identifier);
                metrics::record_quota("rejected");
                return Err(GatewayError::QuotaExceeded {
                    identifier: identifier.to_string(),
                });
            }
            metrics::record_quota("allowed");
        }

        let key = cache_key(self.provider.name(), request);

        // 2. Cache lookup, skipped for fresh requests
        if let Some(store) = &self.store {
            if request.fresh {
                debug!("Fresh request, skipping cache lookup");
            } else if let Some(completion) = Self::lookup(store.as_ref(), &key) {
                debug!("Cache hit: {}", &key[..16]);
                metrics::record_cache_hit();
                return Ok(ChatResponse::from_completion(completion, true));
            } else {
                debug!("Cache miss: {}", &key[..16]);
                metrics::record_cache_miss();
            }
        }

        // 3. Upstream call
        let completion = self.call_provider(request).await?;

        // 4. Persist, even for fresh requests
        if let Some(store) = &self.store {
            self.persist(store.as_ref(), &key, &completion);
        }

        // 5. Consume one unit of quota
        let tries_remaining = match &self.quota {
            Some(quota) => Self::consume(quota, identifier).await,
            None => None,
        };

        Ok(ChatResponse::from_completion(completion, false).with_tries_remaining(tries_remaining))
    }

    /// Cached payloads that no longer decode are treated as misses.
    fn lookup(store: &dyn ExpiringStore, key: &str) -> Option<Completion> {
        let payload = store.get(key)?;
        match serde_json::from_str(&payload) {
            Ok(completion) => Some(completion),
            Err(e) => {
                debug!("Ignoring undecodable cached payload: {}", e);
                None
            }
        }
    }

    async fn call_provider(&self, request: &ChatRequest) -> Result<Completion> {
        let provider = self.provider.name();
        let started = Instant::now();
        let result = self.provider.chat(request).await;
        metrics::record_upstream_call(provider, result.is_ok(), started.elapsed().as_secs_f64());

        let completion = result.map_err(|e| {
            warn!("{} call failed: {}", provider, e);
            e.into_upstream()
        })?;

        metrics::record_tokens(
            &completion.model,
            completion.prompt_tokens,
            completion.completion_tokens,
        );
        Ok(completion)
    }

    fn persist(&self, store: &dyn ExpiringStore, key: &str, completion: &Completion) {
        let written = serde_json::to_string(completion)
            .map_err(GatewayError::from)
            .and_then(|payload| store.put(key, &payload, self.cache_ttl));

        match written {
            Ok(()) => {
                debug!("Cached response under {} for {}s", &key[..16], self.cache_ttl);
                metrics::record_cache_write(true);
            }
            Err(e) => {
                warn!("Failed to cache response: {}", e);
                metrics::record_cache_write(false);
            }
        }
    }

    /// `consume` may block on the counter lock, so it runs off the async executor.
    async fn consume(quota: &Arc<dyn QuotaCounter>, identifier: &str) -> Option<u32> {
        let quota = Arc::clone(quota);
        let identifier = identifier.to_string();

        match tokio::task::spawn_blocking(move || quota.consume(&identifier)).await {
            Ok(Ok(remaining)) => {
                metrics::record_quota("consumed");
                Some(remaining)
            }
            Ok(Err(e)) => {
                warn!("Failed to consume quota: {}", e);
                metrics::record_quota("consume_error");
                None
            }
            Err(e) => {
                warn!("Quota consume task failed: {}", e);
                metrics::record_quota("consume_error");
                None
            }
        }
    }
}
