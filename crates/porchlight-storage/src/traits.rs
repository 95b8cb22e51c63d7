//! Storage abstraction trait
//!
//! The contract every storage backend must implement. The media pipeline
//! produces assets and hands them to a `Storage` by key; it never touches
//! backend specifics.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// **Key format:** `{category}/{entity_id}/{filename}`; see the crate root
/// documentation and the `keys` module.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a specific storage key, overwriting any existing
    /// object. Returns the key back for convenience.
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str)
        -> StorageResult<String>;

    /// Download an object by its storage key.
    async fn get(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete an object by its storage key.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;
}
