//! Formatters for CLI output: positions, balances, reports

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::ledger::{Trade, TradeSide};
use crate::portfolio::types::{
    AnalyticsReport, AssetPerformance, BalanceRow, ExclusionEntry, FifoPnlReport, PnlReport,
    Position,
};
use crate::timeutil::format_ms;

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn signed(value: Decimal) -> String {
    let text = format!("{:.2}", value.round_dp(2));
    if value >= Decimal::ZERO {
        text.bright_green().to_string()
    } else {
        text.bright_red().to_string()
    }
}

fn side_cell(side: TradeSide) -> String {
    match side {
        TradeSide::Buy => side.as_str().bright_green().to_string(),
        TradeSide::Sell => side.as_str().bright_red().to_string(),
    }
}

pub fn positions_table(positions: &BTreeMap<String, Position>) -> String {
    if positions.is_empty() {
        return "No open positions.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Asset", "Free", "Locked", "Avg Cost", "Price", "Value", "Unrealized", "Unrealized %",
        ]);

    for position in positions.values() {
        table.add_row(vec![
            position.asset.clone(),
            position.free_qty.to_string(),
            position.locked_qty.to_string(),
            money(position.avg_cost),
            money(position.current_price),
            money(position.current_value()),
            signed(position.unrealized_pnl),
            signed(position.unrealized_pnl_percent),
        ]);
    }

    table.to_string()
}

pub fn balances_table(rows: &[BalanceRow]) -> String {
    if rows.is_empty() {
        return "No balances to show.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Asset", "Free", "Locked"]);

    for row in rows {
        table.add_row(vec![
            row.asset.clone(),
            row.free.to_string(),
            row.locked.to_string(),
        ]);
    }

    table.to_string()
}

pub fn trades_table(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "No trades recorded.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Time", "Symbol", "Side", "Quantity", "Price", "Quote Qty", "Fee", "Type",
        ]);

    for trade in trades {
        table.add_row(vec![
            format_ms(trade.timestamp),
            trade.symbol.clone(),
            side_cell(trade.side),
            trade.quantity.to_string(),
            money(trade.price),
            money(trade.quote_qty),
            format!("{} {}", trade.commission, trade.commission_asset),
            trade.order_type.clone(),
        ]);
    }

    table.to_string()
}

pub fn render_analytics(report: &AnalyticsReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Portfolio Analytics".bold()));
    out.push_str(&format!(
        "  Portfolio value:   {} USDT\n",
        money(report.total_portfolio_value)
    ));
    out.push_str(&format!(
        "  Total invested:    {} USDT\n",
        money(report.total_invested)
    ));
    out.push_str(&format!(
        "  Unrealized PnL:    {} USDT ({}%)\n",
        signed(report.total_unrealized_pnl),
        signed(report.total_unrealized_pnl_percent)
    ));
    out.push_str(&format!(
        "  Realized PnL:      {} USDT\n",
        signed(report.total_realized_pnl)
    ));

    if !report.asset_allocation.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Asset", "Value", "Share %", "Quantity"]);
        for (asset, slice) in &report.asset_allocation {
            table.add_row(vec![
                asset.clone(),
                money(slice.value),
                money(slice.percentage),
                slice.quantity.to_string(),
            ]);
        }
        out.push_str("\nAllocation:\n");
        out.push_str(&table.to_string());
        out.push('\n');
    }

    if !report.top_performers.is_empty() {
        out.push_str("\nTop performers:\n");
        for entry in &report.top_performers {
            out.push_str(&format!(
                "  {:<8} {}%\n",
                entry.asset,
                signed(entry.unrealized_pnl_percent)
            ));
        }
        out.push_str("Worst performers:\n");
        for entry in &report.worst_performers {
            out.push_str(&format!(
                "  {:<8} {}%\n",
                entry.asset,
                signed(entry.unrealized_pnl_percent)
            ));
        }
    }

    let stats = &report.trading_stats;
    out.push_str(&format!(
        "\nTrading stats: {} trades ({} buys / {} sells), volume {} USDT, avg size {} USDT\n",
        stats.total_trades,
        stats.buy_trades,
        stats.sell_trades,
        money(stats.total_volume),
        money(stats.avg_trade_size)
    ));
    if let Some(asset) = &stats.most_traded_asset {
        out.push_str(&format!(
            "  Most traded: {} ({} trades/day)\n",
            asset, stats.trades_per_day
        ));
    }

    out
}

pub fn render_pnl(report: &PnlReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} → {}\n",
        "PnL report".bold(),
        format_ms(report.start_ts),
        format_ms(report.end_ts)
    ));
    out.push_str(&format!(
        "  Spent:      {} USDT\n",
        money(report.summary.usdt_spent)
    ));
    out.push_str(&format!(
        "  Received:   {} USDT\n",
        money(report.summary.usdt_received)
    ));
    out.push_str(&format!(
        "  Realized:   {} USDT\n",
        signed(report.summary.realized_pnl)
    ));
    out.push_str(&format!(
        "  Unrealized: {} USDT\n",
        signed(report.summary.unrealized_pnl)
    ));
    out.push_str(&format!(
        "  Total:      {} USDT (ROI {}%)\n",
        signed(report.summary.total_pnl),
        signed(report.summary.roi_percent)
    ));

    if !report.assets.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Asset", "Balance", "Cost", "Sales", "Price", "Value", "Realized", "Unrealized",
                "Total",
            ]);
        for (asset, entry) in &report.assets {
            let price = if entry.price_degraded {
                "n/a".to_string()
            } else {
                money(entry.current_price)
            };
            table.add_row(vec![
                asset.clone(),
                entry.current_balance.to_string(),
                money(entry.total_cost),
                money(entry.total_sales),
                price,
                money(entry.current_value),
                signed(entry.realized_pnl),
                signed(entry.unrealized_pnl),
                signed(entry.total_pnl),
            ]);
        }
        out.push('\n');
        out.push_str(&table.to_string());
        out.push('\n');
    }

    if !report.fees.is_empty() {
        out.push_str("\nFees paid:\n");
        for (asset, amount) in &report.fees {
            out.push_str(&format!("  {} {}\n", amount, asset));
        }
    }

    if !report.degraded_assets.is_empty() {
        out.push_str(&format!(
            "\n{} unrealized figures degraded to 0 (price unavailable): {}\n",
            "⚠".yellow(),
            report.degraded_assets.join(", ")
        ));
    }

    out
}

pub fn render_fifo(report: &FifoPnlReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} (alternate lot-matching model)\n",
        "FIFO realized PnL".bold()
    ));
    out.push_str(&format!(
        "  Total realized: {} USDT\n",
        signed(report.realized_pnl)
    ));

    for (asset, pnl) in &report.per_asset {
        out.push_str(&format!("  {:<8} {}\n", asset, signed(*pnl)));
    }

    if !report.unmatched_sells.is_empty() {
        out.push_str("\nSell quantity with no matching buy lot (booked at zero PnL):\n");
        for (asset, qty) in &report.unmatched_sells {
            out.push_str(&format!("  {:<8} {}\n", asset, qty));
        }
    }

    out
}

pub fn render_performance(report: &AssetPerformance) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} over the last {} days\n",
        report.asset.bold(),
        report.period_days
    ));
    out.push_str(&format!(
        "  Trades: {} ({} buys / {} sells)\n",
        report.total_trades, report.buy_trades, report.sell_trades
    ));
    out.push_str(&format!(
        "  Bought {} @ avg {} | Sold {} @ avg {}\n",
        report.total_bought,
        money(report.avg_buy_price),
        report.total_sold,
        money(report.avg_sell_price)
    ));
    out.push_str(&format!("  Net position: {}\n", report.net_position));

    match &report.current_holding {
        Some(position) => out.push_str(&format!(
            "  Holding: {} (avg cost {}, unrealized {})\n",
            position.total_quantity(),
            money(position.avg_cost),
            signed(position.unrealized_pnl)
        )),
        None => out.push_str("  No current holding.\n"),
    }

    out
}

pub fn exclusions_table(entries: &[ExclusionEntry]) -> String {
    if entries.is_empty() {
        return "Exclusion registry is empty.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Asset", "Reason", "Added"]);

    for entry in entries {
        table.add_row(vec![
            entry.asset.clone(),
            entry.reason.clone(),
            format_ms(entry.added_at),
        ]);
    }

    table.to_string()
}
