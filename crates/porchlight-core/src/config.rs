//! Configuration module
//!
//! Configuration is loaded once from the environment at startup and handed
//! to the service by value. Stores built from it (query cache, rate limiter)
//! are explicitly constructed and injected; nothing here is a global.

use std::env;

// Common defaults
const SERVER_PORT: u16 = 8080;
const HTTP_RATE_LIMIT_PER_MINUTE: u32 = 30;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MAX_IMAGE_DIMENSION: u32 = 2000;
const THUMBNAIL_DIMENSION: u32 = 256;
const GEO_RESULT_LIMIT: u32 = 5;
const GEO_CACHE_TTL_SECONDS: u64 = 300;
const GEO_CACHE_MAX_ENTRIES: usize = 1000;
const GEO_API_URL: &str = "https://api.geoapify.com/v1/geocode/autocomplete";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub http_rate_limit_per_minute: u32,
    // Media pipeline
    pub max_upload_bytes: usize,
    pub max_image_dimension: u32,
    pub thumbnail_dimension: u32,
    pub local_storage_path: String,
    // Location autocomplete proxy
    pub geo_api_url: String,
    pub geo_api_key: Option<String>,
    pub geo_result_limit: u32,
    pub geo_country_filter: Option<String>,
    pub geo_cache_ttl_seconds: u64,
    pub geo_cache_max_entries: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env if present; ignore when running from a clean environment
        dotenvy::dotenv().ok();

        Ok(Self {
            server_port: parse_env("PORT", SERVER_PORT)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origins: parse_list(env::var("CORS_ORIGINS").ok()),
            http_rate_limit_per_minute: parse_env(
                "HTTP_RATE_LIMIT_PER_MINUTE",
                HTTP_RATE_LIMIT_PER_MINUTE,
            )?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,
            max_image_dimension: parse_env("MAX_IMAGE_DIMENSION", MAX_IMAGE_DIMENSION)?,
            thumbnail_dimension: parse_env("THUMBNAIL_DIMENSION", THUMBNAIL_DIMENSION)?,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data".to_string()),
            geo_api_url: env::var("GEO_API_URL").unwrap_or_else(|_| GEO_API_URL.to_string()),
            geo_api_key: env::var("GEOAPIFY_API_KEY").ok().filter(|s| !s.is_empty()),
            geo_result_limit: parse_env("GEO_RESULT_LIMIT", GEO_RESULT_LIMIT)?,
            geo_country_filter: env::var("GEO_COUNTRY_FILTER").ok().filter(|s| !s.is_empty()),
            geo_cache_ttl_seconds: parse_env("GEO_CACHE_TTL_SECONDS", GEO_CACHE_TTL_SECONDS)?,
            geo_cache_max_entries: parse_env("GEO_CACHE_MAX_ENTRIES", GEO_CACHE_MAX_ENTRIES)?,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Parse an environment variable, falling back to a default when unset.
/// An unparsable value is a hard error so misconfiguration fails at startup.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        let origins = parse_list(Some(
            "https://app.example.com, https://staging.example.com,,".to_string(),
        ));
        assert_eq!(
            origins,
            vec![
                "https://app.example.com".to_string(),
                "https://staging.example.com".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(parse_list(None).is_empty());
        assert!(parse_list(Some(String::new())).is_empty());
    }
}
