//! Location autocomplete proxy
//!
//! A bounded-lifetime cache and quota-gated proxy in front of an external
//! location-autocomplete provider:
//! - Time-bounded response cache with lazy eviction (cache)
//! - Quota decision contract plus a fixed-window in-memory limiter (limiter)
//! - Upstream provider contract and the Geoapify-style client (provider)
//! - Orchestration: limit → validate → config → cache → fetch → fill (proxy)

pub mod cache;
pub mod limiter;
pub mod provider;
pub mod proxy;

pub use cache::QueryCache;
pub use limiter::{FixedWindowLimiter, RateLimitDecision, RateLimiter};
pub use provider::{GeoapifyProvider, SuggestionProvider};
pub use proxy::{AutocompleteProxy, CacheStatus, SuggestionResponse};
