//! Service and store construction
//!
//! The query cache and rate limiter are the service instance's shared
//! mutable state: constructed once here, injected everywhere, disposable
//! on shutdown.

use crate::state::AppState;
use anyhow::{Context, Result};
use porchlight_core::Config;
use porchlight_geo::{
    AutocompleteProxy, FixedWindowLimiter, GeoapifyProvider, QueryCache, RateLimiter,
    SuggestionProvider,
};
use porchlight_processing::{PhotoPipeline, UploadValidator};
use porchlight_storage::LocalStorage;
use std::sync::Arc;
use std::time::Duration;

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let storage = LocalStorage::new(&config.local_storage_path)
        .await
        .context("Failed to initialize local storage")?;

    let cache = Arc::new(QueryCache::new(config.geo_cache_max_entries));
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(FixedWindowLimiter::new(config.http_rate_limit_per_minute));

    // No credential means no provider; the proxy reports the missing
    // configuration per request instead of refusing to boot.
    let provider: Option<Arc<dyn SuggestionProvider>> = config.geo_api_key.as_ref().map(|key| {
        Arc::new(GeoapifyProvider::new(
            config.geo_api_url.clone(),
            key.clone(),
            config.geo_result_limit,
            config.geo_country_filter.clone(),
        )) as Arc<dyn SuggestionProvider>
    });

    let proxy = AutocompleteProxy::new(
        cache,
        limiter,
        provider,
        Duration::from_secs(config.geo_cache_ttl_seconds),
    );

    let pipeline = PhotoPipeline::new(config.max_image_dimension, config.thumbnail_dimension);
    let validator = UploadValidator::new(config.max_upload_bytes);

    Ok(Arc::new(AppState {
        config: config.clone(),
        proxy,
        pipeline,
        validator,
        storage: Arc::new(storage),
    }))
}
