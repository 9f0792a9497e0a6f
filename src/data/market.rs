//! CoinGecko market-data client
//!
//! Fetches coin metadata, live prices, OHLC candles and market-chart series.
//! Every call is routed through the shared `CacheManager` with a per-endpoint
//! TTL, and every fetch goes through the retrying `Fetcher`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{Candle, Coin, CoinMetadata, FallbackStore, MarketChart, MarketSnapshot, SeriesPoint, Snapshot};
use crate::cache::{CacheKey, CacheManager};
use crate::fetch::{query_params, FetchResult, Fetcher, QueryParams};

/// Base URL for the CoinGecko v3 API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Default lookback window for history endpoints, in days
pub const DEFAULT_HISTORY_DAYS: u32 = 90;

/// Default quote currency
pub const DEFAULT_CURRENCY: &str = "usd";

/// How long each kind of response stays cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Live price snapshot
    pub live_market: Duration,
    /// OHLC candles and market-chart series
    pub history: Duration,
    /// Coin metadata
    pub metadata: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            live_market: Duration::from_secs(300),
            history: Duration::from_secs(600),
            metadata: Duration::from_secs(600),
        }
    }
}

/// Client for the market-data endpoints of one coin
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    fetcher: Fetcher,
    cache: CacheManager,
    base_url: String,
    coin: Coin,
    currency: String,
    ttls: CacheTtls,
    fallback: Option<FallbackStore>,
}

impl MarketDataClient {
    /// Creates a client for Ethereum quoted in USD against the public API
    pub fn new(fetcher: Fetcher, cache: CacheManager) -> Self {
        Self {
            fetcher,
            cache,
            base_url: COINGECKO_BASE_URL.to_string(),
            coin: Coin::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            ttls: CacheTtls::default(),
            fallback: None,
        }
    }

    /// Points the client at a different API root (trailing slash optional)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_coin(mut self, coin: Coin) -> Self {
        self.coin = coin;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Serves local snapshots for history endpoints that stay unavailable
    pub fn with_fallback(mut self, fallback: FallbackStore) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn coin(&self) -> Coin {
        self.coin
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// Fetches static project metadata (`/coins/{id}`)
    pub async fn metadata(&self) -> FetchResult {
        let url = format!("{}/coins/{}", self.base_url, self.coin.api_id());
        self.fetch_cached(url, QueryParams::new(), self.ttls.metadata, None)
            .await
    }

    /// Fetches the live price snapshot (`/simple/price`)
    pub async fn live_market(&self) -> FetchResult {
        let url = format!("{}/simple/price", self.base_url);
        let params = query_params([
            ("ids", self.coin.api_id()),
            ("vs_currencies", self.currency.as_str()),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
        ]);
        self.fetch_cached(url, params, self.ttls.live_market, None)
            .await
    }

    /// Fetches OHLC candles for the last `days` days (`/coins/{id}/ohlc`)
    pub async fn ohlc(&self, days: u32) -> FetchResult {
        let url = format!("{}/coins/{}/ohlc", self.base_url, self.coin.api_id());
        self.fetch_cached(url, self.history_params(days), self.ttls.history, Some(Snapshot::Ohlc))
            .await
    }

    /// Fetches price, market-cap and volume series (`/coins/{id}/market_chart`)
    pub async fn market_chart(&self, days: u32) -> FetchResult {
        let url = format!("{}/coins/{}/market_chart", self.base_url, self.coin.api_id());
        self.fetch_cached(
            url,
            self.history_params(days),
            self.ttls.history,
            Some(Snapshot::MarketChart),
        )
        .await
    }

    fn history_params(&self, days: u32) -> QueryParams {
        query_params([
            ("vs_currency", self.currency.clone()),
            ("days", days.to_string()),
        ])
    }

    async fn fetch_cached(
        &self,
        url: String,
        params: QueryParams,
        ttl: Duration,
        snapshot: Option<Snapshot>,
    ) -> FetchResult {
        let key = CacheKey::new(url.as_str(), &params);
        self.cache
            .cached(key, ttl, || self.fetch_or_fallback(&url, &params, snapshot))
            .await
    }

    async fn fetch_or_fallback(
        &self,
        url: &str,
        params: &QueryParams,
        snapshot: Option<Snapshot>,
    ) -> FetchResult {
        if let Some(payload) = self.fetcher.fetch(url, params).await {
            return Some(payload);
        }

        let (store, snapshot) = (self.fallback.as_ref()?, snapshot?);
        let payload = store.load(snapshot);
        if payload.is_some() {
            info!(url, snapshot = ?snapshot, "serving fallback snapshot");
        }
        payload
    }
}

/// Converts a millisecond epoch value into a UTC timestamp
fn timestamp_from_millis(value: &Value) -> Option<DateTime<Utc>> {
    let millis = value.as_f64()?;
    DateTime::from_timestamp_millis(millis as i64)
}

impl MarketSnapshot {
    /// Builds a snapshot from a `/simple/price` payload.
    ///
    /// Returns `None` when the payload has no entry for `coin`. Missing
    /// numeric fields inside the entry read as zero.
    pub fn from_payload(payload: &Value, coin: Coin, currency: &str) -> Option<Self> {
        let entry = payload.get(coin.api_id())?.as_object()?;
        let field = |suffix: &str| {
            entry
                .get(&format!("{}{}", currency, suffix))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };

        Some(Self {
            price: field(""),
            change_24h: field("_24h_change"),
            market_cap: field("_market_cap"),
            volume_24h: field("_24h_vol"),
            currency: currency.to_string(),
        })
    }
}

/// Parses `[ms, open, high, low, close]` rows, skipping malformed ones
pub fn parse_candles(payload: &Value) -> Vec<Candle> {
    let Some(rows) = payload.as_array() else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            if row.len() < 5 {
                return None;
            }
            Some(Candle {
                timestamp: timestamp_from_millis(&row[0])?,
                open: row[1].as_f64()?,
                high: row[2].as_f64()?,
                low: row[3].as_f64()?,
                close: row[4].as_f64()?,
            })
        })
        .collect()
}

/// Parses `[ms, value]` rows, skipping malformed ones
pub fn parse_series(series: Option<&Value>) -> Vec<SeriesPoint> {
    let Some(rows) = series.and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            Some(SeriesPoint {
                timestamp: timestamp_from_millis(row.first()?)?,
                value: row.get(1)?.as_f64()?,
            })
        })
        .collect()
}

impl MarketChart {
    /// Builds the three series from a `/market_chart` payload.
    ///
    /// Returns `None` when the payload is not an object.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload.as_object()?;
        Some(Self {
            prices: parse_series(payload.get("prices")),
            market_caps: parse_series(payload.get("market_caps")),
            total_volumes: parse_series(payload.get("total_volumes")),
        })
    }
}

/// Subset of the `/coins/{id}` response the dashboard shows
#[derive(Debug, Deserialize)]
struct MetadataResponse {
    name: String,
    symbol: String,
    #[serde(default)]
    hashing_algorithm: Option<String>,
    #[serde(default)]
    categories: Vec<Option<String>>,
    #[serde(default)]
    image: Option<ImageLinks>,
    #[serde(default)]
    links: Option<ProjectLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectLinks {
    #[serde(default)]
    homepage: Vec<Option<String>>,
    #[serde(default)]
    blockchain_site: Vec<Option<String>>,
}

/// First non-empty link in a CoinGecko link list
fn first_link(links: &[Option<String>]) -> Option<String> {
    links
        .iter()
        .flatten()
        .find(|link| !link.trim().is_empty())
        .cloned()
}

impl CoinMetadata {
    /// Builds metadata from a `/coins/{id}` payload.
    ///
    /// Returns `None` when name or symbol are missing.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let response = MetadataResponse::deserialize(payload).ok()?;
        let links = response.links.as_ref();

        Some(Self {
            name: response.name,
            symbol: response.symbol,
            logo_url: response.image.and_then(|image| image.large),
            hashing_algorithm: response
                .hashing_algorithm
                .filter(|algo| !algo.trim().is_empty()),
            categories: response.categories.into_iter().flatten().collect(),
            homepage: links.and_then(|l| first_link(&l.homepage)),
            explorer: links.and_then(|l| first_link(&l.blockchain_site)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use serde_json::json;
    use tempfile::TempDir;

    /// Sample `/simple/price` response
    fn price_payload() -> Value {
        json!({
            "ethereum": {
                "usd": 2345.678,
                "usd_market_cap": 281234567890.12,
                "usd_24h_vol": 12345678.9,
                "usd_24h_change": -2.5
            }
        })
    }

    /// Client whose every fetch fails fast
    fn offline_client() -> MarketDataClient {
        let fetcher = Fetcher::new(RetryPolicy::new(1, Duration::ZERO));
        MarketDataClient::new(fetcher, CacheManager::new()).with_base_url("http://127.0.0.1:1")
    }

    #[test]
    fn test_snapshot_from_valid_payload() {
        let snapshot = MarketSnapshot::from_payload(&price_payload(), Coin::Ethereum, "usd")
            .expect("snapshot should parse");

        assert!((snapshot.price - 2345.678).abs() < 1e-9);
        assert!((snapshot.change_24h + 2.5).abs() < 1e-9);
        assert!((snapshot.market_cap - 281234567890.12).abs() < 1e-3);
        assert!((snapshot.volume_24h - 12345678.9).abs() < 1e-6);
        assert_eq!(snapshot.currency, "usd");
    }

    #[test]
    fn test_snapshot_missing_coin_is_none() {
        assert!(MarketSnapshot::from_payload(&price_payload(), Coin::Bitcoin, "usd").is_none());
        assert!(MarketSnapshot::from_payload(&json!({}), Coin::Ethereum, "usd").is_none());
        assert!(MarketSnapshot::from_payload(&json!([]), Coin::Ethereum, "usd").is_none());
    }

    #[test]
    fn test_snapshot_missing_fields_default_to_zero() {
        let payload = json!({ "ethereum": { "usd": 10.0 } });
        let snapshot = MarketSnapshot::from_payload(&payload, Coin::Ethereum, "usd").unwrap();
        assert!((snapshot.price - 10.0).abs() < 1e-9);
        assert_eq!(snapshot.market_cap, 0.0);
        assert_eq!(snapshot.volume_24h, 0.0);
        assert_eq!(snapshot.change_24h, 0.0);
    }

    #[test]
    fn test_parse_candles() {
        let payload = json!([
            [1704067200000i64, 2280.1, 2310.0, 2270.5, 2300.2],
            [1704081600000i64, 2300.2, 2320.0, 2290.0, 2295.0]
        ]);
        let candles = parse_candles(&payload);

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1704067200000);
        assert!((candles[0].open - 2280.1).abs() < 1e-9);
        assert!((candles[1].close - 2295.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_candles_skips_malformed_rows() {
        let payload = json!([
            [1704067200000i64, 1.0, 2.0, 0.5, 1.5],
            [1704067200000i64, 1.0, 2.0],
            "garbage",
            [1704067200000i64, "x", 2.0, 0.5, 1.5]
        ]);
        assert_eq!(parse_candles(&payload).len(), 1);
    }

    #[test]
    fn test_parse_candles_from_non_array_is_empty() {
        assert!(parse_candles(&json!({"error": "rate limited"})).is_empty());
        assert!(parse_candles(&json!([])).is_empty());
    }

    #[test]
    fn test_market_chart_from_payload() {
        let payload = json!({
            "prices": [[1704067200000i64, 2300.0], [1704153600000i64, 2350.0]],
            "market_caps": [[1704067200000i64, 2.7e11]],
            "total_volumes": []
        });
        let chart = MarketChart::from_payload(&payload).unwrap();

        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.market_caps.len(), 1);
        assert!(chart.total_volumes.is_empty());
    }

    #[test]
    fn test_market_chart_missing_series_are_empty() {
        let chart = MarketChart::from_payload(&json!({ "prices": [] })).unwrap();
        assert!(chart.market_caps.is_empty());
        assert!(MarketChart::from_payload(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_metadata_from_payload() {
        let payload = json!({
            "id": "ethereum",
            "name": "Ethereum",
            "symbol": "eth",
            "hashing_algorithm": "Ethash",
            "categories": ["Smart Contract Platform", null, "Layer 1 (L1)"],
            "image": { "large": "https://assets.example/eth.png" },
            "links": {
                "homepage": ["", "https://www.ethereum.org/"],
                "blockchain_site": ["https://etherscan.io/", ""]
            }
        });
        let meta = CoinMetadata::from_payload(&payload).unwrap();

        assert_eq!(meta.name, "Ethereum");
        assert_eq!(meta.symbol, "eth");
        assert_eq!(meta.hashing_algorithm.as_deref(), Some("Ethash"));
        assert_eq!(meta.categories, vec!["Smart Contract Platform", "Layer 1 (L1)"]);
        assert_eq!(meta.logo_url.as_deref(), Some("https://assets.example/eth.png"));
        assert_eq!(meta.homepage.as_deref(), Some("https://www.ethereum.org/"));
        assert_eq!(meta.explorer.as_deref(), Some("https://etherscan.io/"));
    }

    #[test]
    fn test_metadata_requires_name_and_symbol() {
        assert!(CoinMetadata::from_payload(&json!({ "name": "Ethereum" })).is_none());
        assert!(CoinMetadata::from_payload(&json!(null)).is_none());
    }

    #[test]
    fn test_metadata_optional_fields_missing() {
        let meta = CoinMetadata::from_payload(&json!({
            "name": "Solana",
            "symbol": "sol",
            "hashing_algorithm": null
        }))
        .unwrap();
        assert!(meta.hashing_algorithm.is_none());
        assert!(meta.categories.is_empty());
        assert!(meta.homepage.is_none());
        assert!(meta.logo_url.is_none());
    }

    #[test]
    fn test_default_ttls() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.live_market, Duration::from_secs(300));
        assert_eq!(ttls.history, Duration::from_secs(600));
        assert_eq!(ttls.metadata, Duration::from_secs(600));
    }

    #[test]
    fn test_builder_normalises_inputs() {
        let client = MarketDataClient::new(Fetcher::default(), CacheManager::new())
            .with_base_url("https://api.example/v3/")
            .with_coin(Coin::Solana)
            .with_currency("EUR");

        assert_eq!(client.base_url, "https://api.example/v3");
        assert_eq!(client.coin(), Coin::Solana);
        assert_eq!(client.currency(), "eur");
    }

    #[tokio::test]
    async fn test_unavailable_endpoint_returns_none_and_caches_absence() {
        let cache = CacheManager::new();
        let fetcher = Fetcher::new(RetryPolicy::new(1, Duration::ZERO));
        let client = MarketDataClient::new(fetcher, cache.clone()).with_base_url("http://127.0.0.1:1");

        assert!(client.live_market().await.is_none());
        assert_eq!(cache.len(), 1);
        assert!(client.live_market().await.is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_history_falls_back_to_snapshot_when_configured() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            dir.path().join("backup_ohlc.json"),
            "[[1704067200000, 1.0, 2.0, 0.5, 1.5]]",
        )
        .unwrap();

        let client = offline_client().with_fallback(FallbackStore::new(dir.path().to_path_buf()));
        let payload = client.ohlc(90).await.expect("fallback should be served");
        assert_eq!(parse_candles(&payload).len(), 1);

        // No snapshot on disk for the market chart
        assert!(client.market_chart(90).await.is_none());
    }

    #[tokio::test]
    async fn test_live_market_never_uses_fallback() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join("backup_ohlc.json"), "[]").unwrap();
        std::fs::write(dir.path().join("backup_market_chart.json"), "{}").unwrap();

        let client = offline_client().with_fallback(FallbackStore::new(dir.path().to_path_buf()));
        assert!(client.live_market().await.is_none());
        assert!(client.metadata().await.is_none());
    }
}
