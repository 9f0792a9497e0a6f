//! Command-line interface parsing for coindash
//!
//! This module handles parsing of CLI arguments using clap. Coin names are
//! validated here so a typo fails before the terminal switches to the TUI.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::data::Coin;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified coin is not recognized
    #[error("Invalid coin: '{0}'. Valid coins: eth, btc, sol, xrp")]
    InvalidCoin(String),

    /// The history window must cover at least one day
    #[error("Invalid history window: {0} days. Use a value of 1 or more")]
    InvalidDays(u32),
}

/// coindash - Live crypto market dashboard with next-day price predictions
#[derive(Parser, Debug)]
#[command(name = "coindash")]
#[command(about = "Terminal dashboard for crypto market data and price predictions")]
#[command(version)]
pub struct Cli {
    /// Coin to track
    ///
    /// Valid coins: eth, btc, sol, xrp (full names work too)
    #[arg(long, value_name = "COIN")]
    pub coin: Option<String>,

    /// Lookback window for the history charts, in days
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Path to a config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip the prediction service warm-up request
    #[arg(long)]
    pub no_warm_up: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

/// Overrides derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Coin selected on the command line
    pub coin: Option<Coin>,
    /// History window selected on the command line
    pub history_days: Option<u32>,
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
    /// Whether the warm-up request is disabled
    pub no_warm_up: bool,
    /// Whether debug logging is forced
    pub verbose: bool,
}

/// Parses a coin string argument into a Coin enum.
///
/// # Arguments
/// * `s` - The coin string from CLI
///
/// # Returns
/// * `Ok(Coin)` if the string matches a supported coin
/// * `Err(CliError::InvalidCoin)` if the string doesn't match
pub fn parse_coin_arg(s: &str) -> Result<Coin, CliError> {
    Coin::from_str(s).ok_or_else(|| CliError::InvalidCoin(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the requested overrides
    /// * `Err(CliError)` if a coin or history window is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let coin = cli.coin.as_deref().map(parse_coin_arg).transpose()?;

        if let Some(days) = cli.days {
            if days == 0 {
                return Err(CliError::InvalidDays(days));
            }
        }

        Ok(StartupConfig {
            coin,
            history_days: cli.days,
            config_path: cli.config.clone(),
            no_warm_up: cli.no_warm_up,
            verbose: cli.verbose,
        })
    }
}
