//! Photo upload endpoint
//!
//! Accepts a multipart form with the raw file plus the crop the user drew
//! on the displayed image, runs the media pipeline, and stores the
//! rendition and its thumbnail under the key convention.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use porchlight_core::AppError;
use porchlight_processing::{DisplayRect, OutputFormat, OutputSpec};
use porchlight_storage::keys;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const DEFAULT_OUTPUT_DIMENSION: u32 = 512;
const DEFAULT_QUALITY: f32 = 0.85;
const DEFAULT_BACKGROUND: &str = "#ffffff";
const PHOTO_CATEGORY: &str = "photos";

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PhotoUploadResponse {
    pub key: String,
    pub thumbnail_key: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

#[derive(Default)]
struct UploadForm {
    file: Option<(String, String, Vec<u8>)>,
    entity_id: Option<String>,
    crop_x: Option<f64>,
    crop_y: Option<f64>,
    crop_width: Option<f64>,
    crop_height: Option<f64>,
    display_width: Option<f64>,
    display_height: Option<f64>,
    format: Option<String>,
    quality: Option<f32>,
    width: Option<u32>,
    height: Option<u32>,
    background: Option<String>,
}

#[utoipa::path(
    post,
    path = "/photos",
    tag = "photos",
    responses(
        (status = 200, description = "Photo processed and stored", body = PhotoUploadResponse),
        (status = 400, description = "Invalid file, crop, or parameters", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_photo"))]
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_form(multipart).await?;

    let (filename, content_type, data) = form
        .file
        .ok_or_else(|| AppError::Validation("Missing file field".to_string()))?;
    state
        .validator
        .validate(&filename, &content_type, data.len())?;

    let crop = DisplayRect {
        x: required(form.crop_x, "crop_x")?,
        y: required(form.crop_y, "crop_y")?,
        width: required(form.crop_width, "crop_width")?,
        height: required(form.crop_height, "crop_height")?,
    };
    let displayed = (
        required(form.display_width, "display_width")?,
        required(form.display_height, "display_height")?,
    );

    let format = match form.format.as_deref() {
        Some(raw) => OutputFormat::parse(raw)?,
        None => OutputFormat::WebP,
    };
    let spec = OutputSpec::new(
        form.width.unwrap_or(DEFAULT_OUTPUT_DIMENSION),
        form.height.unwrap_or(DEFAULT_OUTPUT_DIMENSION),
        format,
        form.quality.unwrap_or(DEFAULT_QUALITY),
        form.background.as_deref().unwrap_or(DEFAULT_BACKGROUND),
    )?;

    // The guard cancels the token if the caller disconnects and this
    // future is dropped mid-pipeline.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let photo = state
        .pipeline
        .run(data, crop, displayed, &spec, &cancel)
        .await?;

    let entity_id = form
        .entity_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let filename = format!("{}.{}", Uuid::new_v4(), format.extension());
    let key = keys::storage_key(PHOTO_CATEGORY, &entity_id, &filename);
    let thumb_key = keys::thumbnail_key(&key)
        .ok_or_else(|| AppError::Internal(format!("storage key has no thumbnail form: {}", key)))?;

    let size_bytes = photo.primary.data.len();
    state
        .storage
        .put(&key, photo.primary.data, photo.primary.content_type)
        .await
        .map_err(HttpAppError::from)?;
    state
        .storage
        .put(&thumb_key, photo.thumbnail.data, photo.thumbnail.content_type)
        .await
        .map_err(HttpAppError::from)?;

    tracing::info!(
        key = %key,
        size_bytes = size_bytes,
        source_width = photo.source_width,
        source_height = photo.source_height,
        "Photo processed and stored"
    );

    Ok(Json(PhotoUploadResponse {
        key,
        thumbnail_key: thumb_key,
        content_type: photo.primary.content_type.to_string(),
        width: spec.width,
        height: spec.height,
        size_bytes,
    }))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing required field: {}", name)))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
                form.file = Some((filename, content_type, data.to_vec()));
            }
            "entity_id" => form.entity_id = Some(text(field).await?),
            "crop_x" => form.crop_x = Some(number(field, "crop_x").await?),
            "crop_y" => form.crop_y = Some(number(field, "crop_y").await?),
            "crop_width" => form.crop_width = Some(number(field, "crop_width").await?),
            "crop_height" => form.crop_height = Some(number(field, "crop_height").await?),
            "display_width" => form.display_width = Some(number(field, "display_width").await?),
            "display_height" => form.display_height = Some(number(field, "display_height").await?),
            "format" => form.format = Some(text(field).await?),
            "quality" => form.quality = Some(number(field, "quality").await?),
            "width" => form.width = Some(number(field, "width").await?),
            "height" => form.height = Some(number(field, "height").await?),
            "background" => form.background = Some(text(field).await?),
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid field value: {}", e)))
}

async fn number<T: std::str::FromStr>(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<T, AppError> {
    text(field)
        .await?
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Validation(format!("Invalid numeric value for {}", name)))
}
