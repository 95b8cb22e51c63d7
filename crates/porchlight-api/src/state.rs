//! Application state
//!
//! Everything the handlers need, constructed once at startup and injected.
//! The query cache and rate limiter live here for the process lifetime;
//! their contents are disposable, so there is no teardown.

use porchlight_core::Config;
use porchlight_geo::AutocompleteProxy;
use porchlight_processing::{PhotoPipeline, UploadValidator};
use porchlight_storage::Storage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub proxy: AutocompleteProxy,
    pub pipeline: PhotoPipeline,
    pub validator: UploadValidator,
    pub storage: Arc<dyn Storage>,
}
