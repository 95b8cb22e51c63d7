//! Upstream suggestion provider
//!
//! The provider contract the proxy fetches through, plus the Geoapify
//! autocomplete client. The upstream response body is passed through
//! verbatim; shaping is the caller's concern. Upstream failure detail is
//! logged here and never surfaced.

use async_trait::async_trait;
use porchlight_core::AppError;
use serde_json::Value;

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Provider name, used as the cache key namespace.
    fn name(&self) -> &'static str;

    /// Fetch suggestions for an already-validated, trimmed query.
    async fn fetch(&self, query: &str) -> Result<Value, AppError>;
}

/// Geoapify geocode autocomplete client.
pub struct GeoapifyProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    result_limit: u32,
    country_filter: Option<String>,
}

impl GeoapifyProvider {
    pub fn new(
        api_url: String,
        api_key: String,
        result_limit: u32,
        country_filter: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            result_limit,
            country_filter,
        }
    }
}

#[async_trait]
impl SuggestionProvider for GeoapifyProvider {
    fn name(&self) -> &'static str {
        "geoapify"
    }

    async fn fetch(&self, query: &str) -> Result<Value, AppError> {
        let mut request = self.client.get(&self.api_url).query(&[
            ("text", query),
            ("limit", &self.result_limit.to_string()),
            ("format", "geojson"),
            ("apiKey", &self.api_key),
        ]);
        if let Some(countries) = &self.country_filter {
            request = request.query(&[("filter", format!("countrycode:{}", countries))]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("upstream request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Autocomplete upstream returned an error"
            );
            return Err(AppError::Upstream {
                status: status.as_u16(),
                detail: body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Internal(format!("upstream returned invalid JSON: {}", e)))
    }
}
