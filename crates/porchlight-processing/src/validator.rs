//! Upload validation
//!
//! Validates a submitted file before any pixel work happens: size bounds,
//! accepted content types, and the explicit HEIC/HEIF rejection with a
//! user-facing re-export message.

use porchlight_core::AppError;
use std::path::Path;

const ACCEPTED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/webp"];
const REJECTED_CONTENT_TYPES: &[&str] = &["image/heic", "image/heif"];
const REJECTED_EXTENSIONS: &[&str] = &["heic", "heif"];

pub const HEIC_REJECTION_MESSAGE: &str =
    "HEIC/HEIF photos are not supported. Please re-export the photo as JPEG or PNG and try again.";

/// Validates uploads against the configured limits.
pub struct UploadValidator {
    max_bytes: usize,
}

impl UploadValidator {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn validate(
        &self,
        filename: &str,
        content_type: &str,
        size: usize,
    ) -> Result<(), AppError> {
        if size == 0 {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(AppError::Validation(format!(
                "File too large: {} bytes (max: {} bytes)",
                size, self.max_bytes
            )));
        }

        let content_type = content_type.to_lowercase();
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        // HEIC gets its own message; a generic "unsupported type" would
        // leave iPhone users with no path forward.
        if REJECTED_CONTENT_TYPES.contains(&content_type.as_str())
            || REJECTED_EXTENSIONS.contains(&extension.as_str())
        {
            return Err(AppError::Validation(HEIC_REJECTION_MESSAGE.to_string()));
        }

        if !ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported file type '{}' (allowed: {})",
                content_type,
                ACCEPTED_CONTENT_TYPES.join(", ")
            )));
        }

        Ok(())
    }
}
