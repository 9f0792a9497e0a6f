//! Supported coins and their API identifiers

use serde::{Deserialize, Serialize};

/// Coins the dashboard can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Coin {
    #[default]
    Ethereum,
    Bitcoin,
    Solana,
    Ripple,
}

impl Coin {
    /// Returns a slice containing all coin variants.
    pub fn all() -> &'static [Coin] {
        &[Coin::Ethereum, Coin::Bitcoin, Coin::Solana, Coin::Ripple]
    }

    /// CoinGecko identifier used in API paths and as the key of price payloads
    pub fn api_id(&self) -> &'static str {
        match self {
            Coin::Ethereum => "ethereum",
            Coin::Bitcoin => "bitcoin",
            Coin::Solana => "solana",
            Coin::Ripple => "ripple",
        }
    }

    /// Ticker symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Coin::Ethereum => "ETH",
            Coin::Bitcoin => "BTC",
            Coin::Solana => "SOL",
            Coin::Ripple => "XRP",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Coin::Ethereum => "Ethereum",
            Coin::Bitcoin => "Bitcoin",
            Coin::Solana => "Solana",
            Coin::Ripple => "XRP",
        }
    }

    /// Parses a coin from its name, API id or ticker (case-insensitive).
    pub fn from_str(s: &str) -> Option<Coin> {
        match s.trim().to_lowercase().as_str() {
            "eth" | "ethereum" => Some(Coin::Ethereum),
            "btc" | "bitcoin" => Some(Coin::Bitcoin),
            "sol" | "solana" => Some(Coin::Solana),
            "xrp" | "ripple" => Some(Coin::Ripple),
            _ => None,
        }
    }
}

impl TryFrom<String> for Coin {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Coin::from_str(&value).ok_or_else(|| format!("unknown coin '{}'", value))
    }
}

impl From<Coin> for String {
    fn from(coin: Coin) -> Self {
        coin.api_id().to_string()
    }
}
