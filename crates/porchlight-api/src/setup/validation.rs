//! Startup configuration validation

use anyhow::{bail, Result};
use porchlight_core::Config;

/// Fail fast on values that would only break at request time.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.max_image_dimension == 0 {
        bail!("MAX_IMAGE_DIMENSION must be positive");
    }
    if config.thumbnail_dimension == 0 {
        bail!("THUMBNAIL_DIMENSION must be positive");
    }
    if config.max_upload_bytes == 0 {
        bail!("MAX_UPLOAD_BYTES must be positive");
    }
    if config.geo_result_limit == 0 {
        bail!("GEO_RESULT_LIMIT must be positive");
    }
    if config.http_rate_limit_per_minute == 0 {
        bail!("HTTP_RATE_LIMIT_PER_MINUTE must be positive");
    }

    if config.geo_api_key.is_none() {
        tracing::warn!(
            "GEOAPIFY_API_KEY is not set; location autocomplete will answer with a configuration error"
        );
    }
    if config.cors_origins.is_empty() {
        tracing::warn!("CORS_ORIGINS is empty; no cross-origin requests will be granted");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 8080,
            environment: "test".to_string(),
            cors_origins: vec![],
            http_rate_limit_per_minute: 30,
            max_upload_bytes: 1024,
            max_image_dimension: 2000,
            thumbnail_dimension: 256,
            local_storage_path: "./data".to_string(),
            geo_api_url: "https://example.com".to_string(),
            geo_api_key: None,
            geo_result_limit: 5,
            geo_country_filter: None,
            geo_cache_ttl_seconds: 300,
            geo_cache_max_entries: 1000,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_zero_dimension_fails() {
        let mut config = base_config();
        config.max_image_dimension = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_rate_limit_fails() {
        let mut config = base_config();
        config.http_rate_limit_per_minute = 0;
        assert!(validate_config(&config).is_err());
    }
}
