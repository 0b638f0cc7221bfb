//! Binance-style REST client used as price oracle and balance source
//!
//! Requests carry a bounded timeout and are retried once before the failure
//! is surfaced; callers degrade the affected computation rather than fail
//! the whole request. Account reads are HMAC-SHA256 signed.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::errors::PaperbotError;
use crate::timeutil;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected payload: {0}")]
    Decode(String),

    #[error("credentials missing: set PAPERBOT_API_KEY and PAPERBOT_API_SECRET")]
    MissingCredentials,
}

impl From<ExchangeError> for PaperbotError {
    fn from(e: ExchangeError) -> Self {
        PaperbotError::ExternalService(e.to_string())
    }
}

/// One balance row from the exchange's account endpoint
#[derive(Debug, Clone)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// What the accounting engine needs from the exchange. Implemented by
/// [`BinanceClient`] in production and by stubs in tests.
#[async_trait]
pub trait ExchangeDataSource: Send + Sync {
    /// Latest trade price for a pair symbol, e.g. `ETHUSDT`.
    async fn current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Ground-truth account balances (non-zero rows only).
    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError>;
}

pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    recv_window: u64,
}

#[derive(Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    balances: Vec<RawBalance>,
}

#[derive(Deserialize)]
struct RawBalance {
    asset: String,
    free: String,
    locked: String,
}

impl BinanceClient {
    pub fn new(settings: &Settings) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.exchange_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            recv_window: settings.recv_window,
        })
    }

    fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let secret = self
            .api_secret
            .as_deref()
            .ok_or(ExchangeError::MissingCredentials)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ExchangeError::Decode(format!("invalid secret: {}", e)))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn get(&self, url: &str, signed: bool) -> Result<reqwest::Response, ExchangeError> {
        let mut request = self.http.get(url);
        if signed {
            let key = self
                .api_key
                .as_deref()
                .ok_or(ExchangeError::MissingCredentials)?;
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// One retry, then the failure propagates and the caller degrades.
    async fn get_with_retry(
        &self,
        url: &str,
        signed: bool,
    ) -> Result<reqwest::Response, ExchangeError> {
        match self.get(url, signed).await {
            Ok(response) => Ok(response),
            Err(ExchangeError::MissingCredentials) => Err(ExchangeError::MissingCredentials),
            Err(first) => {
                debug!(error = %first, "Exchange request failed, retrying once");
                self.get(url, signed).await
            }
        }
    }

    fn parse_decimal(raw: &str, what: &str) -> Result<Decimal, ExchangeError> {
        Decimal::from_str(raw)
            .map_err(|e| ExchangeError::Decode(format!("bad {} '{}': {}", what, raw, e)))
    }
}

#[async_trait]
impl ExchangeDataSource for BinanceClient {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let url = format!("{}/v3/ticker/price?symbol={}", self.base_url, symbol);

        let ticker: TickerPrice = self
            .get_with_retry(&url, false)
            .await?
            .json()
            .await
            .map_err(|e| ExchangeError::Decode(e.to_string()))?;

        let price = Self::parse_decimal(&ticker.price, "price")?;
        debug!(symbol = %symbol, price = %price, "Fetched current price");
        Ok(price)
    }

    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        let query = format!(
            "timestamp={}&recvWindow={}",
            timeutil::now_ms(),
            self.recv_window
        );
        let signature = self.sign(&query)?;
        let url = format!(
            "{}/v3/account?{}&signature={}",
            self.base_url, query, signature
        );

        let account: AccountResponse = self
            .get_with_retry(&url, true)
            .await?
            .json()
            .await
            .map_err(|e| ExchangeError::Decode(e.to_string()))?;

        let mut balances = Vec::new();
        for raw in account.balances {
            let free = match Self::parse_decimal(&raw.free, "free balance") {
                Ok(v) => v,
                Err(e) => {
                    warn!(asset = %raw.asset, error = %e, "Skipping unparseable balance row");
                    continue;
                }
            };
            let locked = match Self::parse_decimal(&raw.locked, "locked balance") {
                Ok(v) => v,
                Err(e) => {
                    warn!(asset = %raw.asset, error = %e, "Skipping unparseable balance row");
                    continue;
                }
            };

            if free > Decimal::ZERO || locked > Decimal::ZERO {
                balances.push(AssetBalance {
                    asset: raw.asset,
                    free,
                    locked,
                });
            }
        }

        debug!(count = balances.len(), "Fetched account balances");
        Ok(balances)
    }
}
