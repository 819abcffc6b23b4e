//! Plain-text tables for the console.

use std::fmt::Write;
use std::time::Duration;

use crate::model::{PairRef, TokenId, TradeRecord, TraderRecord};

pub const PREVIEW_ROWS: usize = 5;

/// Top rows of the leaderboard: rank, address, bought USD, sold USD, PnL.
pub fn trader_preview(traders: &[TraderRecord], rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3} | {:<44} | {:>12} | {:>12} | {:>12}",
        "#", "Address", "Bought", "Sold", "PnL"
    );
    let _ = writeln!(out, "{}", "-".repeat(95));
    for t in traders.iter().take(rows) {
        let _ = writeln!(
            out,
            "{:>3} | {:<44} | {:>12} | {:>12} | {:>12}",
            t.rank,
            truncate(&t.address, 44),
            or_dash(&t.bought.usd),
            or_dash(&t.sold.usd),
            or_dash(&t.pnl),
        );
    }
    if traders.len() > rows {
        let _ = writeln!(out, "... {} more in file", traders.len() - rows);
    }
    out
}

pub fn token_list(tokens: &[TokenId]) -> String {
    let mut out = String::new();
    for (i, t) in tokens.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, t);
    }
    out
}

/// One line per token: trader count and summed realized profit.
pub fn leaderboard_summary(boards: &[(TokenId, Vec<TradeRecord>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<44} | {:>7} | {:>16}", "Token", "Traders", "Realized PnL");
    let _ = writeln!(out, "{}", "-".repeat(73));
    for (token, records) in boards {
        let profit: f64 = records.iter().map(|r| r.realized_profit).sum();
        let _ = writeln!(
            out,
            "{:<44} | {:>7} | {:>16.2}",
            truncate(token.as_str(), 44),
            records.len(),
            profit
        );
    }
    out
}

pub fn pair_table(pairs: &[PairRef]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>3} | {:<10} | {}", "#", "Chain", "Pair");
    let _ = writeln!(out, "{}", "-".repeat(64));
    for (i, p) in pairs.iter().enumerate() {
        let chain = truncate(&p.chain_id, 10);
        let _ = writeln!(out, "{:>3} | {:<10} | {}", i + 1, chain, p.pair_address);
    }
    out
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
