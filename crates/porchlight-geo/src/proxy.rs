//! Autocomplete proxy orchestration
//!
//! An ordered state machine where every step is a potential early exit:
//! rate-limit check, validation, configuration check, cache lookup,
//! upstream fetch, cache fill. A denied quota skips all downstream work;
//! a cache hit skips the upstream call.
//!
//! Two concurrent misses for one key may both reach the upstream and both
//! write (last write wins). The payload is idempotent, so this is accepted
//! rather than deduplicated; the cache's own lock keeps the map itself
//! consistent.

use crate::cache::QueryCache;
use crate::limiter::RateLimiter;
use crate::provider::SuggestionProvider;
use porchlight_core::AppError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 64;

/// Quota bucket name for autocomplete requests.
pub const QUOTA_BUCKET: &str = "location-autocomplete";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Upstream payload plus the metadata the HTTP layer needs to shape the
/// response (cache tag, shared-cache TTL).
#[derive(Debug, Clone)]
pub struct SuggestionResponse {
    pub payload: Value,
    pub cache: CacheStatus,
    pub ttl: Duration,
}

pub struct AutocompleteProxy {
    cache: Arc<QueryCache>,
    limiter: Arc<dyn RateLimiter>,
    provider: Option<Arc<dyn SuggestionProvider>>,
    ttl: Duration,
}

impl AutocompleteProxy {
    /// `provider` is `None` when the upstream credential is absent; the
    /// proxy then fails the configuration check at request time instead of
    /// refusing to start.
    pub fn new(
        cache: Arc<QueryCache>,
        limiter: Arc<dyn RateLimiter>,
        provider: Option<Arc<dyn SuggestionProvider>>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            limiter,
            provider,
            ttl,
        }
    }

    #[tracing::instrument(skip(self, raw_query), fields(operation = "autocomplete"))]
    pub async fn suggest(
        &self,
        client_id: &str,
        raw_query: &str,
    ) -> Result<SuggestionResponse, AppError> {
        // 1. Rate limit: a deny skips every downstream step.
        let decision = self.limiter.check(client_id, QUOTA_BUCKET).await;
        if !decision.allowed {
            return Err(AppError::RateLimited {
                retry_after: decision.retry_after,
            });
        }

        // 2. Validate: trimmed length within inclusive bounds.
        let query = raw_query.trim();
        let chars = query.chars().count();
        if chars < MIN_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "Query must be at least {} characters",
                MIN_QUERY_CHARS
            )));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "Query must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }

        // 3. Configuration: the message never names the missing secret.
        let provider = self.provider.as_ref().ok_or_else(|| {
            AppError::Config("location autocomplete provider credential is not set".to_string())
        })?;

        // 4. Cache lookup.
        let key = QueryCache::cache_key(provider.name(), query);
        if let Some(payload) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "Autocomplete cache hit");
            return Ok(SuggestionResponse {
                payload,
                cache: CacheStatus::Hit,
                ttl: self.ttl,
            });
        }

        // 5. Upstream fetch.
        let payload = provider.fetch(query).await?;

        // 6. Cache fill.
        self.cache.set(key, payload.clone(), self.ttl).await;

        Ok(SuggestionResponse {
            payload,
            cache: CacheStatus::Miss,
            ttl: self.ttl,
        })
    }
}
