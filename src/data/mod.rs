//! Core data models for the market dashboard
//!
//! This module contains the typed views the dashboard renders, built from the
//! raw JSON payloads returned by the market-data API, plus the API clients.

pub mod coin;
pub mod fallback;
pub mod market;
pub mod prediction;

pub use coin::Coin;
pub use fallback::{FallbackStore, Snapshot};
pub use market::{CacheTtls, MarketDataClient, DEFAULT_HISTORY_DAYS};
pub use prediction::PredictionClient;

use chrono::{DateTime, Utc};

/// Live market figures for one coin in one currency
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    /// Current price
    pub price: f64,
    /// Price change over the last 24 hours, in percent
    pub change_24h: f64,
    /// Market capitalisation
    pub market_cap: f64,
    /// Traded volume over the last 24 hours
    pub volume_24h: f64,
    /// Currency code the figures are quoted in (e.g. "usd")
    pub currency: String,
}

/// One OHLC candle
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// Start of the candle period
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// True when the candle closed at or above its open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// A single point of a market-chart series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Historical price, market cap and volume series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketChart {
    pub prices: Vec<SeriesPoint>,
    pub market_caps: Vec<SeriesPoint>,
    pub total_volumes: Vec<SeriesPoint>,
}

/// Static project information for a coin
#[derive(Debug, Clone, PartialEq)]
pub struct CoinMetadata {
    pub name: String,
    pub symbol: String,
    /// URL of the large logo image
    pub logo_url: Option<String>,
    /// Consensus hashing algorithm, when the API reports one
    pub hashing_algorithm: Option<String>,
    pub categories: Vec<String>,
    pub homepage: Option<String>,
    /// First block explorer link
    pub explorer: Option<String>,
}

/// Everything one page load produced, each panel independently optional
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    /// Live KPIs, `None` when the price endpoint was unavailable
    pub snapshot: Option<MarketSnapshot>,
    /// OHLC candles, `None` when unavailable or empty
    pub candles: Option<Vec<Candle>>,
    /// Market-chart series, `None` when unavailable
    pub chart: Option<MarketChart>,
    /// Project fundamentals, `None` when unavailable
    pub metadata: Option<CoinMetadata>,
}
