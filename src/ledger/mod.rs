//! Trade ledger: durable, append-only, time-ordered store of executed trades

pub mod store;
pub mod types;

pub use store::TradeLedger;
pub use types::{split_symbol, Trade, TradeDraft, TradeSide};
