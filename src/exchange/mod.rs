//! Exchange collaborator: live prices and ground-truth balances

pub mod client;

pub use client::{AssetBalance, BinanceClient, ExchangeDataSource, ExchangeError};
