//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use porchlight_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/location-autocomplete",
            get(handlers::autocomplete::autocomplete).options(preflight),
        )
        .route("/photos", post(handlers::photo_upload::upload_photo))
        .with_state(state);

    let docs: Router = utoipa_rapidoc::RapiDoc::with_openapi("/openapi.json", ApiDoc::openapi())
        .path("/docs")
        .into();

    // Server-level concurrency limit to protect against resource
    // exhaustion under extreme load.
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = api
        .merge(docs)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Non-preflight OPTIONS probes get an empty 204; real preflights are
/// answered by the CORS layer before they reach the router.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Cross-origin policy: echo the caller's origin only when it is on the
/// configured allow-list; otherwise no origin-granting header is emitted.
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use porchlight_core::AppError;
    use porchlight_geo::{
        AutocompleteProxy, FixedWindowLimiter, QueryCache, RateLimitDecision, RateLimiter,
        SuggestionProvider,
    };
    use porchlight_processing::{PhotoPipeline, UploadValidator};
    use porchlight_storage::LocalStorage;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    struct StubProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, query: &str) -> Result<Value, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "features": [{ "properties": { "formatted": query } }] }))
        }
    }

    struct DenyAll;

    #[async_trait]
    impl RateLimiter for DenyAll {
        async fn check(&self, _client_id: &str, _bucket: &str) -> RateLimitDecision {
            RateLimitDecision::deny(Some(9))
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        Config {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["https://app.example.com".to_string()],
            http_rate_limit_per_minute: 100,
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 2000,
            thumbnail_dimension: 32,
            local_storage_path: dir.path().to_string_lossy().into_owned(),
            geo_api_url: "http://unused".to_string(),
            geo_api_key: Some("test-key".to_string()),
            geo_result_limit: 5,
            geo_country_filter: None,
            geo_cache_ttl_seconds: 300,
            geo_cache_max_entries: 1000,
        }
    }

    async fn test_app(
        dir: &tempfile::TempDir,
        limiter: Arc<dyn RateLimiter>,
    ) -> (Router, Arc<StubProvider>) {
        let config = test_config(dir);
        let provider = Arc::new(StubProvider {
            calls: AtomicUsize::new(0),
        });
        let proxy = AutocompleteProxy::new(
            Arc::new(QueryCache::new(config.geo_cache_max_entries)),
            limiter,
            Some(provider.clone()),
            Duration::from_secs(config.geo_cache_ttl_seconds),
        );
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let state = Arc::new(AppState {
            proxy,
            pipeline: PhotoPipeline::new(config.max_image_dimension, config.thumbnail_dimension),
            validator: UploadValidator::new(config.max_upload_bytes),
            storage: Arc::new(storage),
            config: config.clone(),
        });
        (setup_routes(&config, state).unwrap(), provider)
    }

    fn get(uri: &str) -> Request<Body> {
        let addr: SocketAddr = "203.0.113.5:4711".parse().unwrap();
        Request::builder()
            .uri(uri)
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_autocomplete_miss_then_hit_headers() {
        let dir = tempfile::tempdir().unwrap();
        let (app, provider) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let first = app
            .clone()
            .oneshot(get("/location-autocomplete?q=Lisbon"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers().get("X-Cache").unwrap(), "MISS");
        assert_eq!(
            first.headers().get("Cache-Control").unwrap(),
            "public, s-maxage=300"
        );

        let second = app
            .oneshot(get("/location-autocomplete?q=Lisbon"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers().get("X-Cache").unwrap(), "HIT");
        assert!(second.headers().get("Cache-Control").is_none());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_autocomplete_missing_query_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (app, provider) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let response = app.oneshot(get("/location-autocomplete")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("q"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_autocomplete_short_query_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let response = app
            .oneshot(get("/location-autocomplete?q=ab"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("at least 3"));
    }

    #[tokio::test]
    async fn test_autocomplete_throttled_is_429_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let (app, provider) = test_app(&dir, Arc::new(DenyAll)).await;

        let response = app
            .oneshot(get("/location-autocomplete?q=Lisbon"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "9");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_options_returns_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let addr: SocketAddr = "203.0.113.5:4711".parse().unwrap();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/location-autocomplete")
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_cors_echoes_only_allowlisted_origins() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let mut request = get("/health");
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_static("https://app.example.com"));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );

        let mut request = get("/health");
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_static("https://evil.example.com"));
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_photo_upload_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let png = {
            let img = image::RgbaImage::from_pixel(200, 150, image::Rgba([40, 90, 160, 255]));
            let mut buffer = Vec::new();
            let mut cursor = std::io::Cursor::new(&mut buffer);
            img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
            buffer
        };

        let boundary = "porchlight-test-boundary";
        let mut body = Vec::new();
        let mut push_text = |name: &str, value: &str| {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    boundary, name, value
                )
                .as_bytes(),
            );
        };
        // Displayed at 100x75 for the 200x150 source: scale factor 2 on
        // both axes, so the full-frame crop maps to the full image.
        push_text("crop_x", "0");
        push_text("crop_y", "0");
        push_text("crop_width", "100");
        push_text("crop_height", "75");
        push_text("display_width", "100");
        push_text("display_height", "75");
        push_text("entity_id", "42");
        push_text("format", "png");
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let addr: SocketAddr = "203.0.113.5:4711".parse().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/photos")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .extension(ConnectInfo(addr))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        let key = body["key"].as_str().unwrap();
        let thumb_key = body["thumbnail_key"].as_str().unwrap();
        assert!(key.starts_with("photos/42/"));
        assert!(thumb_key.starts_with("photos/42/thumbs/"));
        assert_eq!(body["content_type"], "image/png");

        // Both renditions landed on disk under the derived keys.
        assert!(dir.path().join(key).is_file());
        assert!(dir.path().join(thumb_key).is_file());
    }

    #[tokio::test]
    async fn test_photo_upload_rejects_heic() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir, Arc::new(FixedWindowLimiter::new(100))).await;

        let boundary = "porchlight-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"IMG_0001.heic\"\r\nContent-Type: image/heic\r\n\r\nnot-really-heic\r\n--{b}--\r\n",
            b = boundary
        );

        let addr: SocketAddr = "203.0.113.5:4711".parse().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/photos")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .extension(ConnectInfo(addr))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("re-export"));
    }
}
