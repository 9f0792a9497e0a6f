//! Cache module for API responses
//!
//! Holds fetch results in memory for a per-endpoint TTL. Failed fetches are
//! cached too, so an unavailable endpoint is only retried once its entry
//! expires. Nothing survives a process restart.

mod manager;

pub use manager::{is_expired, CacheEntry, CacheKey, CacheManager};
