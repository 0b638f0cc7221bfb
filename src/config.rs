//! Runtime settings, merged from `PAPERBOT_*` environment variables

use rust_decimal::Decimal;

/// Default exchange REST endpoint (Binance spot testnet).
pub const DEFAULT_EXCHANGE_URL: &str = "https://testnet.binance.vision/api";

/// Positions at or below this quantity are dropped from all holdings views.
pub const DUST_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 6); // 0.000001

/// Known quote suffixes, checked in order; USDT wins when ambiguous.
pub const QUOTE_SUFFIXES: [&str; 3] = ["USDT", "BTC", "ETH"];

/// The currency portfolio values and PnL are denominated in.
pub const QUOTE_CURRENCY: &str = "USDT";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Exchange REST base URL
    pub exchange_url: String,
    /// Exchange API key (required only for signed endpoints)
    pub api_key: Option<String>,
    /// Exchange API secret (required only for signed endpoints)
    pub api_secret: Option<String>,
    /// Signed-request receive window in milliseconds
    pub recv_window: u64,
    /// Per-request timeout for exchange calls, in seconds
    pub request_timeout_secs: u64,
    /// Dust threshold for position removal
    pub dust_threshold: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exchange_url: DEFAULT_EXCHANGE_URL.to_string(),
            api_key: None,
            api_secret: None,
            recv_window: 10_000,
            request_timeout_secs: 10,
            dust_threshold: DUST_THRESHOLD,
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            exchange_url: std::env::var("PAPERBOT_EXCHANGE_URL").unwrap_or(defaults.exchange_url),
            api_key: std::env::var("PAPERBOT_API_KEY").ok(),
            api_secret: std::env::var("PAPERBOT_API_SECRET").ok(),
            recv_window: std::env::var("PAPERBOT_RECV_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.recv_window),
            request_timeout_secs: std::env::var("PAPERBOT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            dust_threshold: defaults.dust_threshold,
        }
    }
}
