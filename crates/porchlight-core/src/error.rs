//! Error types module
//!
//! This module provides the core error types used throughout the Porchlight
//! application. All errors are unified under the `AppError` enum, covering
//! validation, configuration, throttling, upstream, and media-processing
//! failures.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like quota limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPSTREAM_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the caller
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<u64> },

    #[error("Upstream error: status {status}")]
    Upstream { status: u16, detail: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, None, false, LogLevel::Debug),
        AppError::Config(_) => (500, "CONFIG_ERROR", false, None, true, LogLevel::Error),
        AppError::RateLimited { .. } => (
            429,
            "RATE_LIMITED",
            true,
            Some("Wait and retry"),
            false,
            LogLevel::Warn,
        ),
        // Upstream status is surfaced verbatim; anything outside the error
        // range maps to 502 so we never emit a 2xx for a failure.
        AppError::Upstream { status, .. } => (
            if (400..=599).contains(status) {
                *status
            } else {
                502
            },
            "UPSTREAM_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Decode(_) => (400, "DECODE_ERROR", false, None, true, LogLevel::Error),
        AppError::Geometry(_) => (400, "GEOMETRY_ERROR", false, None, false, LogLevel::Debug),
        AppError::Surface(_) => (500, "SURFACE_ERROR", true, None, true, LogLevel::Error),
        AppError::Cancelled => (499, "CANCELLED", false, None, false, LogLevel::Debug),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", false, None, true, LogLevel::Error)
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            // Caller-fixable conditions are surfaced verbatim.
            AppError::Validation(msg) => msg.clone(),
            AppError::Geometry(msg) => msg.clone(),
            AppError::RateLimited { .. } => "Too many requests. Please slow down.".to_string(),
            AppError::Cancelled => "Request cancelled".to_string(),
            // Sensitive errors get a generic message; detail goes to logs only.
            AppError::Config(_) => "Server configuration error".to_string(),
            AppError::Upstream { .. } => {
                "Location search is temporarily unavailable".to_string()
            }
            AppError::Decode(_) => {
                "Unable to process image. The file may be corrupt or unsupported.".to_string()
            }
            AppError::Surface(_) => "Image processing failed".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}

impl AppError {
    /// Detailed message for logs and non-production error bodies.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::Upstream { status, detail } => {
                format!("upstream returned status {}: {}", status, detail)
            }
            other => other.to_string(),
        }
    }

    /// Error type name for structured logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Config(_) => "Config",
            AppError::RateLimited { .. } => "RateLimited",
            AppError::Upstream { .. } => "Upstream",
            AppError::Decode(_) => "Decode",
            AppError::Geometry(_) => "Geometry",
            AppError::Surface(_) => "Surface",
            AppError::Cancelled => "Cancelled",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }
}
