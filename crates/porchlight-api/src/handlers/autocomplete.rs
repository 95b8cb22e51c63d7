//! Location autocomplete endpoint
//!
//! Thin HTTP shell over the proxy orchestration: extracts the caller
//! identity and query, then shapes the proxy result into the response
//! contract (`X-Cache` tag, shared-cache directive on miss).

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::client_ip::extract_client_ip;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use porchlight_core::AppError;
use porchlight_geo::CacheStatus;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AutocompleteParams {
    /// Query text, 3-64 characters after trimming
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/location-autocomplete",
    tag = "geo",
    params(AutocompleteParams),
    responses(
        (status = 200, description = "Suggestions (upstream feature collection, verbatim)"),
        (status = 400, description = "Missing or out-of-bounds query", body = ErrorResponse),
        (status = 429, description = "Quota exceeded", body = ErrorResponse),
        (status = 500, description = "Configuration or unexpected failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, params, headers, addr),
    fields(operation = "location_autocomplete")
)]
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AutocompleteParams>,
) -> Result<Response, HttpAppError> {
    let query = params
        .q
        .ok_or_else(|| AppError::Validation("Missing required query parameter: q".to_string()))?;

    let client_id = extract_client_ip(&headers, addr);
    let suggestion = state.proxy.suggest(&client_id, &query).await?;

    let mut response = Json(suggestion.payload).into_response();
    response.headers_mut().insert(
        "X-Cache",
        HeaderValue::from_static(suggestion.cache.as_str()),
    );
    // A miss advertises the same TTL to any fronting shared cache.
    if suggestion.cache == CacheStatus::Miss {
        let directive = format!("public, s-maxage={}", suggestion.ttl.as_secs());
        if let Ok(value) = HeaderValue::from_str(&directive) {
            response.headers_mut().insert("Cache-Control", value);
        }
    }

    Ok(response)
}
