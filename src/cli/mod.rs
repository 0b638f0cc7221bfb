//! CLI module for Paperbot
//!
//! Command-line interface for the paper-trading accounting backend. Uses clap
//! for argument parsing with one module per subcommand; every command runs
//! against the shared [`PortfolioService`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

pub mod commands;

use crate::config::Settings;
use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::exchange::BinanceClient;
use crate::logging::{init_logging, LogMode, LoggingConfig};
use crate::portfolio::PortfolioService;

use commands::analytics::AnalyticsArgs;
use commands::balances::BalancesArgs;
use commands::exclude::ExcludeArgs;
use commands::migrate::MigrateArgs;
use commands::performance::PerformanceArgs;
use commands::pnl::PnlArgs;
use commands::positions::PositionsArgs;
use commands::record::RecordArgs;
use commands::report::ReportArgs;
use commands::sync::SyncArgs;
use commands::trades::TradesArgs;

#[derive(Parser)]
#[command(name = "paperbot")]
#[command(version)]
#[command(about = "Paper-trading position and PnL accounting backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an executed trade in the ledger
    Record(RecordArgs),

    /// Show current positions with live prices
    Positions(PositionsArgs),

    /// Show tracked balances (exclusion-filtered)
    Balances(BalancesArgs),

    /// Browse trade history
    Trades(TradesArgs),

    /// Time-ranged PnL report (or the FIFO variant)
    Pnl(PnlArgs),

    /// Portfolio analytics: allocation, performers, trading stats
    Analytics(AnalyticsArgs),

    /// Manage the exclusion registry
    Exclude(ExcludeArgs),

    /// Reconcile tracked positions with exchange balances
    Sync(SyncArgs),

    /// Per-asset performance over a recent window
    Performance(PerformanceArgs),

    /// Export the combined portfolio report
    Report(ReportArgs),

    /// Migrate a legacy trade-history file into the ledger
    Migrate(MigrateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);
        data_paths.ensure_directories()?;

        if self.verbose > 0 && std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "debug");
        }
        init_logging(LoggingConfig::new(LogMode::ConsoleAndFile, data_paths.clone()))?;

        let settings = Settings::from_env();
        let exchange = Arc::new(BinanceClient::new(&settings)?);
        let service = PortfolioService::new(settings, data_paths, exchange);

        match self.command {
            Commands::Record(args) => commands::record::execute(&service, args).await,
            Commands::Positions(args) => commands::positions::execute(&service, args).await,
            Commands::Balances(args) => commands::balances::execute(&service, args).await,
            Commands::Trades(args) => commands::trades::execute(&service, args).await,
            Commands::Pnl(args) => commands::pnl::execute(&service, args).await,
            Commands::Analytics(args) => commands::analytics::execute(&service, args).await,
            Commands::Exclude(args) => commands::exclude::execute(&service, args).await,
            Commands::Sync(args) => commands::sync::execute(&service, args).await,
            Commands::Performance(args) => commands::performance::execute(&service, args).await,
            Commands::Report(args) => commands::report::execute(&service, args).await,
            Commands::Migrate(args) => commands::migrate::execute(&service, args).await,
        }
    }
}
