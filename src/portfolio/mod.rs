//! Position & PnL accounting: tracker, durable stores, reports and analytics

pub mod analytics;
pub mod display;
pub mod exclusions;
pub mod fifo;
pub mod pnl;
pub mod service;
pub mod store;
pub mod tracker;
pub mod types;

pub use exclusions::ExclusionRegistry;
pub use service::{HistoryFilter, PortfolioService, ReconcileSummary};
pub use tracker::PositionTracker;
pub use types::{
    AnalyticsReport, AssetPerformance, BalanceRow, ExclusionEntry, FifoPnlReport, PnlReport,
    Position, RealizedPnlEntry,
};
