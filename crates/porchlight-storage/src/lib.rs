//! Porchlight storage
//!
//! Storage key conventions and the storage-backend contract. The backend
//! itself is an external collaborator; this crate ships the trait plus a
//! local filesystem implementation for development.
//!
//! # Storage key format
//!
//! Keys are `{category}/{entity_id}/{filename}` (at least three
//! `/`-separated segments). Thumbnail variants live under a `thumbs`
//! segment inserted before the filename; derivation is centralized in the
//! `keys` module. Keys must not contain `..` or a leading `/`.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::{storage_key, thumbnail_key};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
