//! HTTP fetcher with bounded retries
//!
//! Performs JSON GET requests against flaky public APIs. Every failure mode
//! (transport error, timeout, non-2xx status, malformed body) counts as one
//! failed attempt. Once the attempts are exhausted the fetcher returns the
//! absence signal (`None`) instead of an error.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of a fetch: a parsed JSON payload, or `None` when data is unavailable
pub type FetchResult = Option<Value>;

/// Query parameters, kept sorted so equal sets always serialize the same way
pub type QueryParams = BTreeMap<String, String>;

/// Per-request timeout applied to every attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Number of attempts made before giving up
pub const DEFAULT_RETRIES: u32 = 3;

/// Pause between two failed attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    /// Body was not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// How many times to try a request and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    delay: Duration,
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default timeout.
    ///
    /// `retries` is clamped to at least one attempt.
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self {
            retries: retries.max(1),
            delay,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a failed attempt (1-based) should be followed by a pause and another try
    pub fn should_retry_after(&self, attempt: u32) -> bool {
        attempt < self.retries
    }
}

/// JSON fetcher that never fails past its boundary
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Fetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            policy,
        }
    }

    /// Fetches `url` with the fetcher's retry policy.
    ///
    /// # Returns
    /// * `Some(Value)` - the parsed body of the first successful attempt
    /// * `None` - every attempt failed
    pub async fn fetch(&self, url: &str, params: &QueryParams) -> FetchResult {
        self.fetch_with_policy(url, params, &self.policy).await
    }

    /// Fetches `url`, retrying according to `policy`.
    ///
    /// Sleeps `policy.delay()` after each failed attempt except the last one.
    pub async fn fetch_with_policy(
        &self,
        url: &str,
        params: &QueryParams,
        policy: &RetryPolicy,
    ) -> FetchResult {
        let attempts = policy.retries().max(1);

        for attempt in 1..=attempts {
            match self.try_once(url, params, policy.timeout()).await {
                Ok(payload) => {
                    debug!(url, attempt, "fetch succeeded");
                    return Some(payload);
                }
                Err(err) => {
                    warn!(url, attempt, attempts, error = %err, "fetch attempt failed");
                    if policy.should_retry_after(attempt) {
                        tokio::time::sleep(policy.delay()).await;
                    }
                }
            }
        }

        warn!(url, attempts, "giving up, data unavailable");
        None
    }

    /// Performs a single GET and parses the body
    async fn try_once(
        &self,
        url: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Builds a `QueryParams` map from string pairs
pub fn query_params<I, K, V>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
