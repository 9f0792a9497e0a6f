//! Configuration file handling
//!
//! Settings live in a TOML file (`~/.config/coindash/config.toml` on Linux).
//! Every field has a default, so the file is optional and may be partial.
//! Command-line flags are applied on top via `Config::apply_startup`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::StartupConfig;
use crate::data::market::{COINGECKO_BASE_URL, DEFAULT_CURRENCY};
use crate::data::prediction::PREDICTION_BASE_URL;
use crate::data::{CacheTtls, Coin, DEFAULT_HISTORY_DAYS};
use crate::fetch::RetryPolicy;

/// Name of the config file inside the config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has wrong value types
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The history window must cover at least one day
    #[error("Invalid config file {path}: market.history_days must be 1 or more")]
    InvalidHistoryDays { path: PathBuf },
}

/// Market-data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Root of the CoinGecko-compatible API
    pub api_base: String,
    pub coin: Coin,
    /// Quote currency code
    pub currency: String,
    /// Lookback window for OHLC and market-chart history
    pub history_days: u32,
    /// Directory holding backup_ohlc.json / backup_market_chart.json
    pub fallback_dir: Option<PathBuf>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_base: COINGECKO_BASE_URL.to_string(),
            coin: Coin::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            history_days: DEFAULT_HISTORY_DAYS,
            fallback_dir: None,
        }
    }
}

/// Retry settings for the fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per request (at least one is always made)
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            retries: policy.retries(),
            retry_delay_ms: policy.delay().as_millis() as u64,
            timeout_secs: policy.timeout().as_secs(),
        }
    }
}

impl FetchConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.retry_delay_ms))
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Cache lifetimes in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub live_market_ttl_secs: u64,
    pub history_ttl_secs: u64,
    pub metadata_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttls = CacheTtls::default();
        Self {
            live_market_ttl_secs: ttls.live_market.as_secs(),
            history_ttl_secs: ttls.history.as_secs(),
            metadata_ttl_secs: ttls.metadata.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            live_market: Duration::from_secs(self.live_market_ttl_secs),
            history: Duration::from_secs(self.history_ttl_secs),
            metadata: Duration::from_secs(self.metadata_ttl_secs),
        }
    }
}

/// Prediction service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub base_url: String,
    /// Whether each page load sends a warm-up request
    pub warm_up: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: PREDICTION_BASE_URL.to_string(),
            warm_up: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the `coindash` target (error, warn, info, debug, trace)
    pub level: String,
    /// Directory for coindash.log; the platform data dir when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub market: MarketConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub prediction: PredictionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Returns the platform config file path, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "coindash")?;
        Some(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Parses configuration from TOML text
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.market.history_days == 0 {
            return Err(ConfigError::InvalidHistoryDays {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// Loads configuration from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Loads configuration for startup.
    ///
    /// # Arguments
    /// * `explicit` - Path given on the command line; it must exist
    ///
    /// # Returns
    /// * `Ok(Config)` - parsed file, or defaults when the default file is absent
    /// * `Err(ConfigError)` - unreadable explicit file or invalid TOML
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides
    pub fn apply_startup(&mut self, startup: &StartupConfig) {
        if let Some(coin) = startup.coin {
            self.market.coin = coin;
        }
        if let Some(days) = startup.history_days {
            self.market.history_days = days;
        }
        if startup.no_warm_up {
            self.prediction.warm_up = false;
        }
        if startup.verbose {
            self.logging.level = "debug".to_string();
        }
    }
}
