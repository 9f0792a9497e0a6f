//! Application state management for coindash
//!
//! This module contains the main application state, handling keyboard input,
//! page loads, and the transition from the loading screen to the dashboard.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

use coindash::cache::CacheManager;
use coindash::config::Config;
use coindash::data::market::parse_candles;
use coindash::data::{
    CacheTtls, Coin, CoinMetadata, DashboardData, FallbackStore, MarketChart, MarketDataClient,
    MarketSnapshot, PredictionClient,
};
use coindash::fetch::{FetchResult, Fetcher};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Dashboard showing every panel
    Dashboard,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Parsed panels from the most recent page load
    pub data: DashboardData,
    /// Prediction page for today, set on every page load
    pub prediction_url: Option<String>,
    /// Lookback window for history panels
    pub history_days: u32,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Timestamp of last page load
    pub last_refresh: Option<DateTime<Local>>,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Whether page loads warm up the prediction service
    warm_up: bool,
    /// Market data API client
    market_client: MarketDataClient,
    /// Prediction service client
    prediction_client: PredictionClient,
}

impl App {
    /// Creates a new App instance from the loaded configuration
    pub fn new(config: &Config) -> Self {
        let fetcher = Fetcher::new(config.fetch.policy());
        let mut market_client = MarketDataClient::new(fetcher, CacheManager::new())
            .with_base_url(config.market.api_base.as_str())
            .with_coin(config.market.coin)
            .with_currency(config.market.currency.as_str())
            .with_ttls(config.cache.ttls());
        if let Some(dir) = &config.market.fallback_dir {
            market_client = market_client.with_fallback(FallbackStore::new(dir.clone()));
        }

        let prediction_client = PredictionClient::new()
            .with_base_url(config.prediction.base_url.as_str())
            .with_coin(config.market.coin);

        let mut app = Self::with_clients(market_client, prediction_client);
        app.history_days = config.market.history_days;
        app.warm_up = config.prediction.warm_up;
        app
    }

    /// Creates a new App instance with custom clients
    pub fn with_clients(market_client: MarketDataClient, prediction_client: PredictionClient) -> Self {
        Self {
            state: AppState::Loading,
            data: DashboardData::default(),
            prediction_url: None,
            history_days: coindash::data::DEFAULT_HISTORY_DAYS,
            should_quit: false,
            last_refresh: None,
            refresh_requested: false,
            show_help: false,
            warm_up: true,
            market_client,
            prediction_client,
        }
    }

    /// Coin shown on the dashboard
    pub fn coin(&self) -> Coin {
        self.market_client.coin()
    }

    /// Quote currency code
    pub fn currency(&self) -> &str {
        self.market_client.currency()
    }

    /// How long each panel's data is reused before the next fetch
    pub fn cache_ttls(&self) -> CacheTtls {
        self.market_client.ttls()
    }

    /// Runs one page load.
    ///
    /// Fires the warm-up request first without waiting for it, then requests
    /// the four panels concurrently through the cache. Each panel is parsed on
    /// its own, so one unavailable endpoint never hides another.
    pub async fn load_all_data(&mut self) {
        let today = Local::now().date_naive();
        if self.warm_up {
            self.prediction_client.spawn_warm_up(today);
        }
        self.prediction_url = Some(self.prediction_client.prediction_url(today));

        info!(coin = self.coin().api_id(), days = self.history_days, "page load");

        let days = self.history_days;
        let (live, ohlc, chart, metadata) = futures::join!(
            self.market_client.live_market(),
            self.market_client.ohlc(days),
            self.market_client.market_chart(days),
            self.market_client.metadata(),
        );

        self.data = build_dashboard(self.coin(), self.currency(), live, ohlc, chart, metadata);
        self.last_refresh = Some(Local::now());
        self.refresh_requested = false;
        self.state = AppState::Dashboard;
    }

    /// Handles a key press
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                // Only quit is allowed during loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::Dashboard => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }
}

/// Parses the raw panel payloads into dashboard panels
pub fn build_dashboard(
    coin: Coin,
    currency: &str,
    live: FetchResult,
    ohlc: FetchResult,
    chart: FetchResult,
    metadata: FetchResult,
) -> DashboardData {
    DashboardData {
        snapshot: live.and_then(|payload| MarketSnapshot::from_payload(&payload, coin, currency)),
        candles: ohlc
            .map(|payload| parse_candles(&payload))
            .filter(|candles| !candles.is_empty()),
        chart: chart.and_then(|payload| MarketChart::from_payload(&payload)),
        metadata: metadata.and_then(|payload| CoinMetadata::from_payload(&payload)),
    }
}
