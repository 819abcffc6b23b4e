use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::browser::{Page, RawCell, RawRow};
use crate::error::{Result, ScrapeError};
use crate::model::{Flow, TraderRecord};
use crate::settings::TableLayout;

/// Poll until `ready_selector` exists, else `TableNotFound` after `timeout`.
pub async fn wait_for_table(
    page: &dyn Page,
    ready_selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        if page.has_element(ready_selector).await? {
            info!("Table ready after {}ms", started.elapsed().as_millis());
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(ScrapeError::TableNotFound {
                selector: ready_selector.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Snapshot the leaderboard and parse it. The caller awaits the container first.
pub async fn extract_trader_rows(
    page: &dyn Page,
    layout: &TableLayout,
) -> Result<Vec<TraderRecord>> {
    let rows = page.table_rows(layout).await?;
    let traders = parse_rows(&rows, layout);
    info!("Parsed {} traders from {} rows", traders.len(), rows.len());
    Ok(traders)
}

/// Turn raw rows into trader records, in document order.
///
/// Rows without an explorer link are skipped (headers, footers). The first
/// row for an address claims it even if it is later dropped for an unknown
/// balance, so duplicates after it never surface. Rank counts kept rows only.
pub fn parse_rows(rows: &[RawRow], layout: &TableLayout) -> Vec<TraderRecord> {
    let mut seen = HashSet::new();
    let mut traders = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(link) = explorer_link(&row.links, &layout.explorer_patterns) else {
            debug!("row {}: no explorer link", i);
            continue;
        };

        let address = address_from_url(link);
        if !seen.insert(address.clone()) {
            debug!("row {}: duplicate {}", i, address);
            continue;
        }

        let cols = &layout.columns;
        let balance = cell_text(&row.cells, cols.balance);
        if balance == layout.unknown_balance {
            debug!("row {}: unknown balance for {}", i, address);
            continue;
        }

        traders.push(TraderRecord {
            rank: traders.len() + 1,
            address,
            address_url: link.to_string(),
            bought: flow(row.cells.get(cols.bought)),
            sold: flow(row.cells.get(cols.sold)),
            pnl: cell_text(&row.cells, cols.pnl),
            unrealized: cell_text(&row.cells, cols.unrealized),
            balance,
        });
    }

    traders
}

/// First link containing a pattern, trying patterns in order.
fn explorer_link<'a>(links: &'a [String], patterns: &[String]) -> Option<&'a str> {
    patterns.iter().find_map(|p| {
        links
            .iter()
            .find(|href| href.contains(p.as_str()))
            .map(String::as_str)
    })
}

/// Last path segment of an explorer URL, ignoring query and fragment.
pub fn address_from_url(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segs| segs.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn cell_text(cells: &[RawCell], idx: usize) -> String {
    cells.get(idx).map(|c| c.text.trim().to_string()).unwrap_or_default()
}

fn flow(cell: Option<&RawCell>) -> Flow {
    let Some(cell) = cell else {
        return Flow::default();
    };
    let usd = cell
        .usd
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();
    let sub = |i: usize| {
        cell.sub_values
            .get(i)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    Flow {
        usd,
        tokens: sub(0),
        txns: sub(1),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakePage;

    fn cell(text: &str) -> RawCell {
        RawCell {
            text: text.into(),
            ..RawCell::default()
        }
    }

    fn flow_cell(primary: Option<&str>, secondary: Option<&str>, subs: &[&str]) -> RawCell {
        RawCell {
            text: "…".into(),
            usd: vec![primary.map(Into::into), secondary.map(Into::into)],
            sub_values: subs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn row(href: &str, balance: &str) -> RawRow {
        RawRow {
            links: vec!["https://dexscreener.com/".into(), href.into()],
            cells: vec![
                cell("#"),
                cell("maker"),
                cell(""),
                flow_cell(Some("$1.2K"), None, &["3.1M", "4 txns"]),
                flow_cell(None, Some("$800"), &["2.2M"]),
                cell("+$400"),
                cell("-"),
                cell(balance),
            ],
        }
    }

    #[test]
    fn address_is_last_segment() {
        let sol = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
        assert_eq!(address_from_url(&format!("https://solscan.io/account/{}", sol)), sol);
        assert_eq!(address_from_url("https://bscscan.com/address/0xAbC?tab=tokens"), "0xAbC");
        assert_eq!(address_from_url("not a url/0xdef#x"), "0xdef");
    }

    #[test]
    fn dedup_and_unknown_scenario() {
        let rows = vec![
            row("https://solscan.io/account/AAA", "1.5M"),
            row("https://solscan.io/account/AAA", "9.9M"),
            row("https://solscan.io/account/BBB", "Unknown"),
        ];
        let traders = parse_rows(&rows, &TableLayout::default());
        assert_eq!(traders.len(), 1);
        assert_eq!(traders[0].rank, 1);
        assert_eq!(traders[0].address, "AAA");
        assert_eq!(traders[0].balance, "1.5M");
    }

    #[test]
    fn rank_counts_kept_rows_only() {
        let rows = vec![
            RawRow::default(), // header
            row("https://bscscan.com/address/0x1", "10"),
            row("https://bscscan.com/address/0x1", "10"),
            row("https://bscscan.com/address/0x2", "Unknown"),
            row("https://bscscan.com/address/0x3", "30"),
        ];
        let traders = parse_rows(&rows, &TableLayout::default());
        let ranks: Vec<(usize, &str)> =
            traders.iter().map(|t| (t.rank, t.address.as_str())).collect();
        assert_eq!(ranks, vec![(1, "0x1"), (2, "0x3")]);
    }

    #[test]
    fn unknown_row_still_claims_address() {
        let rows = vec![
            row("https://solscan.io/account/CCC", "Unknown"),
            row("https://solscan.io/account/CCC", "5K"),
        ];
        assert!(parse_rows(&rows, &TableLayout::default()).is_empty());
    }

    #[test]
    fn explorer_patterns_tried_in_order() {
        let mut r = row("https://bscscan.com/address/0xBSC", "1");
        r.links.push("https://solscan.io/account/SOL".into());
        let traders = parse_rows(&[r], &TableLayout::default());
        assert_eq!(traders[0].address, "SOL");
        assert_eq!(traders[0].address_url, "https://solscan.io/account/SOL");
    }

    #[test]
    fn flows_fall_back_and_default() {
        let rows = [row("https://solscan.io/account/DDD", "7")];
        let traders = parse_rows(&rows, &TableLayout::default());
        let t = &traders[0];
        let bought = Flow {
            usd: "$1.2K".into(),
            tokens: "3.1M".into(),
            txns: "4 txns".into(),
        };
        assert_eq!(t.bought, bought);
        assert_eq!(t.sold, Flow { usd: "$800".into(), tokens: "2.2M".into(), txns: String::new() });
        assert_eq!(t.pnl, "+$400");
        assert_eq!(t.unrealized, "-");
    }

    #[test]
    fn empty_primary_usd_falls_through() {
        let c = flow_cell(Some("  "), Some("$5"), &[]);
        assert_eq!(flow(Some(&c)).usd, "$5");
    }

    #[test]
    fn short_rows_keep_empty_fields() {
        let r = RawRow {
            links: vec!["https://solscan.io/account/EEE".into()],
            cells: vec![cell("1")],
        };
        let traders = parse_rows(&[r], &TableLayout::default());
        assert_eq!(traders.len(), 1);
        assert_eq!(traders[0].balance, "");
        assert_eq!(traders[0].bought, Flow::default());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_container_times_out() {
        let page = FakePage::default();
        let err = wait_for_table(
            &page,
            "div.custom-1kikirr",
            Duration::from_secs(10),
            Duration::from_millis(250),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::TableNotFound { waited_ms, .. } if waited_ms >= 10_000));
    }

    #[tokio::test]
    async fn present_container_returns_immediately() {
        let page = FakePage::default().with_element("div.custom-1kikirr");
        let (timeout, poll) = (Duration::from_secs(10), Duration::from_millis(250));
        wait_for_table(&page, "div.custom-1kikirr", timeout, poll)
            .await
            .unwrap();
    }
}
