//! Canonical trade schema and the ingestion boundary that produces it
//!
//! Historical producers disagree on field names (`quoteQty` vs `quote_qty`,
//! `time` vs `timestamp`, ...). Everything entering the system passes through
//! [`TradeDraft`] -> [`Trade::from_draft`], which normalizes names, fills
//! defaults and rejects invalid input. Downstream code only ever sees [`Trade`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{QUOTE_CURRENCY, QUOTE_SUFFIXES};
use crate::errors::{PaperbotError, Result};

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "BUY", alias = "buy", alias = "Buy")]
    Buy,
    #[serde(rename = "SELL", alias = "sell", alias = "Sell")]
    Sell,
}

impl TradeSide {
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            other => Err(PaperbotError::Validation(format!(
                "invalid side '{}': must be BUY or SELL",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executed trade, immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(alias = "quoteQty")]
    pub quote_qty: Decimal,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(alias = "commissionAsset")]
    pub commission_asset: String,
    #[serde(alias = "time")]
    pub timestamp: i64,
    #[serde(alias = "orderType")]
    pub order_type: String,
    /// Order id reported by the exchange, when present
    #[serde(default, alias = "tradeId")]
    pub exchange_order_id: Option<i64>,
}

/// Incoming trade payload before normalization.
///
/// Field-name variants from historical producers are accepted here and
/// nowhere else.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeDraft {
    pub symbol: String,
    pub side: String,
    #[serde(alias = "qty")]
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default, alias = "quoteQty")]
    pub quote_qty: Option<Decimal>,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default, alias = "commissionAsset")]
    pub commission_asset: Option<String>,
    #[serde(alias = "time")]
    pub timestamp: i64,
    #[serde(default, alias = "orderType")]
    pub order_type: Option<String>,
    #[serde(default, alias = "tradeId")]
    pub exchange_order_id: Option<i64>,
}

impl Trade {
    /// Normalize a draft into the canonical schema, validating as we go.
    /// Nothing is applied on failure.
    pub fn from_draft(draft: TradeDraft) -> Result<Self> {
        let symbol = draft.symbol.trim().replace('/', "").to_uppercase();
        if symbol.is_empty() {
            return Err(PaperbotError::Validation("symbol cannot be empty".into()));
        }

        let side = TradeSide::parse(&draft.side)?;

        if draft.quantity <= Decimal::ZERO {
            return Err(PaperbotError::Validation(format!(
                "invalid quantity {}: must be greater than 0",
                draft.quantity
            )));
        }
        if draft.price <= Decimal::ZERO {
            return Err(PaperbotError::Validation(format!(
                "invalid price {}: must be greater than 0",
                draft.price
            )));
        }
        if draft.commission < Decimal::ZERO {
            return Err(PaperbotError::Validation(format!(
                "invalid commission {}: must not be negative",
                draft.commission
            )));
        }
        if draft.timestamp <= 0 {
            return Err(PaperbotError::Validation(format!(
                "invalid timestamp {}: must be a positive millisecond epoch",
                draft.timestamp
            )));
        }

        Ok(Trade {
            id: Uuid::new_v4().to_string(),
            quote_qty: draft
                .quote_qty
                .unwrap_or(draft.quantity * draft.price),
            commission_asset: draft
                .commission_asset
                .unwrap_or_else(|| QUOTE_CURRENCY.to_string()),
            order_type: draft.order_type.unwrap_or_else(|| "MARKET".to_string()),
            symbol,
            side,
            quantity: draft.quantity,
            price: draft.price,
            commission: draft.commission,
            timestamp: draft.timestamp,
            exchange_order_id: draft.exchange_order_id,
        })
    }

    /// Traded asset, e.g. `ETH` for `ETHUSDT`.
    pub fn base_asset(&self) -> &str {
        split_symbol(&self.symbol).0
    }

    /// Pricing currency, e.g. `USDT` for `ETHUSDT`.
    pub fn quote_asset(&self) -> &str {
        split_symbol(&self.symbol).1
    }
}

/// Split a concatenated pair symbol into (base, quote) using the known quote
/// suffixes. USDT is checked first and wins when ambiguous; a symbol with no
/// known suffix is returned whole with the default quote currency.
pub fn split_symbol(symbol: &str) -> (&str, &str) {
    for suffix in QUOTE_SUFFIXES {
        if symbol.len() > suffix.len() && symbol.ends_with(suffix) {
            return (&symbol[..symbol.len() - suffix.len()], suffix);
        }
    }
    (symbol, QUOTE_CURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn draft(symbol: &str, side: &str, qty: Decimal, price: Decimal) -> TradeDraft {
        TradeDraft {
            symbol: symbol.to_string(),
            side: side.to_string(),
            quantity: qty,
            price,
            quote_qty: None,
            commission: Decimal::ZERO,
            commission_asset: None,
            timestamp: 1_700_000_000_000,
            order_type: None,
            exchange_order_id: None,
        }
    }

    #[test]
    fn test_symbol_split() {
        assert_eq!(split_symbol("ETHUSDT"), ("ETH", "USDT"));
        assert_eq!(split_symbol("BTCUSDT"), ("BTC", "USDT"));
        assert_eq!(split_symbol("ETHBTC"), ("ETH", "BTC"));
        assert_eq!(split_symbol("BNBETH"), ("BNB", "ETH"));
        // no known suffix: returned whole, quoted in USDT
        assert_eq!(split_symbol("DOGE"), ("DOGE", "USDT"));
        // a bare quote currency is not its own pair
        assert_eq!(split_symbol("USDT"), ("USDT", "USDT"));
    }

    #[test]
    fn test_from_draft_defaults() {
        let trade = Trade::from_draft(draft("eth/usdt", "buy", dec!(2), dec!(1500))).unwrap();
        assert_eq!(trade.symbol, "ETHUSDT");
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.quote_qty, dec!(3000));
        assert_eq!(trade.commission_asset, "USDT");
        assert_eq!(trade.order_type, "MARKET");
        assert!(!trade.id.is_empty());
    }

    #[test]
    fn test_from_draft_rejects_bad_input() {
        assert!(Trade::from_draft(draft("ETHUSDT", "HODL", dec!(1), dec!(1))).is_err());
        assert!(Trade::from_draft(draft("ETHUSDT", "BUY", dec!(0), dec!(1))).is_err());
        assert!(Trade::from_draft(draft("ETHUSDT", "BUY", dec!(1), dec!(-5))).is_err());
        assert!(Trade::from_draft(draft("", "BUY", dec!(1), dec!(1))).is_err());

        let mut stale = draft("ETHUSDT", "SELL", dec!(1), dec!(1));
        stale.timestamp = 0;
        assert!(Trade::from_draft(stale).is_err());
    }

    #[test]
    fn test_draft_accepts_field_name_variants() {
        let camel: TradeDraft = serde_json::from_value(json!({
            "symbol": "ETHUSDT",
            "side": "BUY",
            "qty": 1.0,
            "price": 2000.0,
            "quoteQty": 2000.0,
            "commissionAsset": "ETH",
            "time": 1700000000000i64,
            "orderType": "LIMIT",
            "tradeId": 42
        }))
        .unwrap();

        let trade = Trade::from_draft(camel).unwrap();
        assert_eq!(trade.quote_qty, dec!(2000));
        assert_eq!(trade.commission_asset, "ETH");
        assert_eq!(trade.timestamp, 1_700_000_000_000);
        assert_eq!(trade.order_type, "LIMIT");
        assert_eq!(trade.exchange_order_id, Some(42));
    }

    #[test]
    fn test_canonical_round_trip() {
        let trade = Trade::from_draft(draft("ETHUSDT", "SELL", dec!(1), dec!(2100))).unwrap();
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, trade.id);
        assert_eq!(back.side, TradeSide::Sell);
        assert_eq!(back.quote_qty, trade.quote_qty);
    }
}
