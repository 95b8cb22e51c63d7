//! OpenAPI documentation

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Porchlight API",
        description = "Media normalization and location autocomplete for the Porchlight community app"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::autocomplete::autocomplete,
        crate::handlers::photo_upload::upload_photo,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
        crate::handlers::photo_upload::PhotoUploadResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "geo", description = "Location autocomplete proxy"),
        (name = "photos", description = "Photo upload and normalization"),
    )
)]
pub struct ApiDoc;
