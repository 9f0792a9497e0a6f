//! In-memory TTL cache for API responses
//!
//! Provides a `CacheManager` that stores fetch results keyed by endpoint and
//! query parameters, together with the instant they were captured.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::fetch::{FetchResult, QueryParams};

/// Identifies one distinct (endpoint, parameter-set) request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    /// Builds a key from an endpoint URL and its query parameters.
    ///
    /// Parameters come from a sorted map, so insertion order never matters.
    pub fn new(endpoint: impl Into<String>, params: &QueryParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// A captured fetch result
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored result, absence included
    pub value: FetchResult,
    /// When the result was stored
    pub captured_at: Instant,
    /// How long the result stays live
    pub ttl: Duration,
}

/// Returns true once an entry is at least `ttl` old
pub fn is_expired(entry: &CacheEntry, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(entry.captured_at) >= ttl
}

/// Caches fetch results per key for a caller-chosen TTL
///
/// Clones share the same underlying map. Entries are never evicted; an
/// expired entry is simply replaced by the next fetch for its key.
#[derive(Debug, Clone, Default)]
pub struct CacheManager {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl CacheManager {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A poisoned map still holds valid entries
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the live value for `key`, judged against the TTL it was stored with
    ///
    /// # Returns
    /// * `Some(FetchResult)` - a live entry exists (the result itself may be absence)
    /// * `None` - no entry, or the entry has expired
    pub fn get(&self, key: &CacheKey) -> Option<FetchResult> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if is_expired(entry, Instant::now(), entry.ttl) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value` for `key`, replacing any previous entry
    pub fn insert(&self, key: CacheKey, value: FetchResult, ttl: Duration) {
        let entry = CacheEntry {
            value,
            captured_at: Instant::now(),
            ttl,
        };
        self.lock().insert(key, entry);
    }

    /// Returns the cached result for `key`, invoking `producer` on miss or expiry.
    ///
    /// The producer's result is stored even when it is `None`, so a failing
    /// endpoint is asked again only after `ttl` has elapsed.
    ///
    /// # Arguments
    /// * `key` - Endpoint and parameters identifying the request
    /// * `ttl` - How long a stored result stays live
    /// * `producer` - Runs the actual fetch
    pub async fn cached<F, Fut>(&self, key: CacheKey, ttl: Duration, producer: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        if let Some(value) = self.get(&key) {
            debug!(endpoint = key.endpoint(), "cache hit");
            return value;
        }

        debug!(endpoint = key.endpoint(), "cache miss");
        let value = producer().await;
        self.insert(key, value.clone(), ttl);
        value
    }

    /// Number of stored entries, live or expired
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
