//! GMGN ranking API, read through a real page so the request carries the
//! site's cookies and passes its bot checks.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::browser::{with_session, Launcher, Page, Readiness};
use crate::error::{Result, ScrapeError};
use crate::model::{TokenId, TradeRecord};
use crate::navigator::{goto, NavOptions};
use crate::settings::Settings;
use crate::target::OutputName;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RankData {
    #[serde(default)]
    rank: Vec<RankRow>,
}

#[derive(Debug, Deserialize)]
struct RankRow {
    address: String,
}

#[derive(Debug, Deserialize)]
struct TraderRow {
    address: String,
    #[serde(default)]
    native_transfer: Option<NativeTransfer>,
    #[serde(default)]
    realized_profit: Option<f64>,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct NativeTransfer {
    #[serde(default)]
    from_address: Option<String>,
}

impl From<TraderRow> for TradeRecord {
    fn from(row: TraderRow) -> Self {
        Self {
            trader_address: row.address,
            linked_wallet_address: row.native_transfer.and_then(|n| n.from_address),
            realized_profit: row.realized_profit.unwrap_or_default(),
            timestamp: row.created_at.unwrap_or_default(),
        }
    }
}

/// Per-token leaderboards from one ranking pass.
#[derive(Debug, Clone, Default)]
pub struct Leaderboards {
    pub output: Option<OutputName>,
    pub boards: Vec<(TokenId, Vec<TradeRecord>)>,
    /// Tokens whose fetch failed and were skipped.
    pub failed: usize,
}

impl Leaderboards {
    pub fn trader_count(&self) -> usize {
        self.boards.iter().map(|(_, r)| r.len()).sum()
    }
}

pub struct Gmgn<'a> {
    launcher: &'a dyn Launcher,
    settings: &'a Settings,
}

impl<'a> Gmgn<'a> {
    pub fn new(launcher: &'a dyn Launcher, settings: &'a Settings) -> Self {
        Self { launcher, settings }
    }

    /// Addresses of the hottest tokens, at most `limit` of them.
    pub async fn rank_tokens(&self, limit: usize, max_allowed: usize) -> Result<Vec<TokenId>> {
        if limit > max_allowed {
            return Err(ScrapeError::LimitExceeded {
                requested: limit,
                max: max_allowed,
            });
        }

        let url = self.settings.gmgn.rank_url.clone();
        let body: Envelope<RankData> = self.fetch(&url).await?;

        let mut tokens: Vec<TokenId> =
            body.data.rank.into_iter().map(|r| TokenId(r.address)).collect();
        tokens.truncate(limit);
        info!("Ranked {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Realized-profit leaderboard for one token, in API order.
    pub async fn top_traders(&self, token: &TokenId) -> Result<Vec<TradeRecord>> {
        let url = self.settings.gmgn.top_traders_url_for(token.as_str());
        let body: Envelope<Vec<TraderRow>> = self.fetch(&url).await?;

        let records: Vec<TradeRecord> = body.data.into_iter().map(TradeRecord::from).collect();
        if records.is_empty() {
            warn!("No traders returned for {}", token);
        }
        Ok(records)
    }

    /// Rank tokens, then fetch each one's leaderboard in turn.
    ///
    /// `output` is validated before anything is launched. `on_token` runs
    /// before each fetch. A token whose fetch fails is logged and skipped;
    /// any other error ends the pass.
    pub async fn leaderboards<F>(
        &self,
        limit: usize,
        output: Option<&str>,
        mut on_token: F,
    ) -> Result<Leaderboards>
    where
        F: FnMut(usize, &TokenId),
    {
        let output = output.map(|name| OutputName::parse(name.trim())).transpose()?;
        let tokens = self.rank_tokens(limit, self.settings.gmgn.max_tokens).await?;

        let mut run = Leaderboards {
            output,
            ..Leaderboards::default()
        };
        for (i, token) in tokens.into_iter().enumerate() {
            on_token(i, &token);
            match self.top_traders(&token).await {
                Ok(records) => run.boards.push((token, records)),
                Err(e @ ScrapeError::FetchFailed { .. }) => {
                    warn!("Skipping {}: {}", token, e);
                    run.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(run)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let opts = NavOptions {
            readiness: Readiness::DomReady,
            timeout: self.settings.timeouts.api_page(),
        };
        let raw = with_session(self.launcher, &self.settings.browser, |page| async move {
            fetch_in_page(page.as_ref(), url, opts).await
        })
        .await?;

        serde_json::from_value(raw).map_err(|e| ScrapeError::FetchFailed {
            url: url.to_string(),
            reason: format!("unexpected response shape: {}", e),
        })
    }
}

/// Navigate to `url` and fetch it again from inside the loaded document.
async fn fetch_in_page(page: &dyn Page, url: &str, opts: NavOptions) -> Result<serde_json::Value> {
    goto(page, url, opts).await?;
    let current = page.current_url().await?;
    page.fetch_json(&current).await
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::browser::fake::{FakeLauncher, FakePage};

    fn rank_body(n: usize) -> serde_json::Value {
        let rows: Vec<_> = (0..n)
            .map(|i| json!({ "address": format!("Tok{}", i), "swaps": 100 - i }))
            .collect();
        json!({ "code": 0, "data": { "rank": rows } })
    }

    #[tokio::test]
    async fn limit_checked_before_launch() {
        let settings = Settings::default();
        let launcher = FakeLauncher::new(FakePage::default());
        let err = Gmgn::new(&launcher, &settings).rank_tokens(51, 50).await.unwrap_err();
        assert!(matches!(err, ScrapeError::LimitExceeded { requested: 51, max: 50 }));
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn rank_truncates_to_limit() {
        let settings = Settings::default();
        let page = FakePage::default().with_json(&settings.gmgn.rank_url, rank_body(8));
        let launcher = FakeLauncher::new(page);

        let tokens = Gmgn::new(&launcher, &settings).rank_tokens(3, 50).await.unwrap();
        let expected: Vec<TokenId> =
            ["Tok0", "Tok1", "Tok2"].iter().map(|t| TokenId(t.to_string())).collect();
        assert_eq!(tokens, expected);
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn rank_shorter_than_limit() {
        let settings = Settings::default();
        let page = FakePage::default().with_json(&settings.gmgn.rank_url, rank_body(2));
        let launcher = FakeLauncher::new(page);
        let tokens = Gmgn::new(&launcher, &settings).rank_tokens(10, 50).await.unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[tokio::test]
    async fn top_traders_projects_rows() {
        let settings = Settings::default();
        let token = TokenId("So1anaTok".into());
        let body = json!({
            "data": [
                {
                    "address": "Trader1",
                    "native_transfer": { "from_address": "Funder1", "name": "coinbase" },
                    "realized_profit": 1520.75,
                    "created_at": 1718000000
                },
                { "address": "Trader2", "native_transfer": null, "realized_profit": -12.5 }
            ]
        });
        let url = settings.gmgn.top_traders_url_for(token.as_str());
        let page = FakePage::default().with_json(&url, body);
        let launcher = FakeLauncher::new(page);

        let records = Gmgn::new(&launcher, &settings).top_traders(&token).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trader_address, "Trader1");
        assert_eq!(records[0].linked_wallet_address.as_deref(), Some("Funder1"));
        assert_eq!(records[0].realized_profit, 1520.75);
        assert_eq!(records[0].timestamp, 1718000000);
        assert_eq!(records[1].linked_wallet_address, None);
        assert_eq!(records[1].timestamp, 0);
    }

    #[tokio::test]
    async fn failed_fetch_differs_from_empty() {
        let settings = Settings::default();
        let token = TokenId("Quiet".into());

        let url = settings.gmgn.top_traders_url_for("Quiet");
        let empty = FakePage::default().with_json(&url, json!({ "data": [] }));
        let launcher = FakeLauncher::new(empty);
        assert!(Gmgn::new(&launcher, &settings).top_traders(&token).await.unwrap().is_empty());

        let launcher = FakeLauncher::new(FakePage::default());
        let err = Gmgn::new(&launcher, &settings).top_traders(&token).await.unwrap_err();
        assert!(matches!(err, ScrapeError::FetchFailed { .. }));
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn error_envelope_is_fetch_failure() {
        let settings = Settings::default();
        let blocked = json!({ "code": 403, "msg": "blocked" });
        let page = FakePage::default().with_json(&settings.gmgn.rank_url, blocked);
        let launcher = FakeLauncher::new(page);
        let err = Gmgn::new(&launcher, &settings).rank_tokens(5, 50).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::FetchFailed { reason, .. } if reason.contains("unexpected response shape")
        ));
    }

    #[tokio::test]
    async fn leaderboards_reject_bad_output_before_launch() {
        let settings = Settings::default();
        let page = FakePage::default().with_json(&settings.gmgn.rank_url, rank_body(3));
        let launcher = FakeLauncher::new(page);
        let mut seen = 0;

        let err = Gmgn::new(&launcher, &settings)
            .leaderboards(3, Some("../x"), |_, _| seen += 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
        assert_eq!(launcher.launches(), 0);
        assert_eq!(seen, 0);
    }

    #[tokio::test]
    async fn leaderboards_skip_failed_tokens() {
        let settings = Settings::default();
        let url = settings.gmgn.top_traders_url_for("Tok1");
        let page = FakePage::default()
            .with_json(&settings.gmgn.rank_url, rank_body(3))
            .with_json(&url, json!({ "data": [{ "address": "W", "realized_profit": 5.0 }] }));
        let launcher = FakeLauncher::new(page);
        let mut visited = Vec::new();

        let run = Gmgn::new(&launcher, &settings)
            .leaderboards(3, Some("board"), |i, t| visited.push((i, t.to_string())))
            .await
            .unwrap();
        assert_eq!(run.output.as_ref().map(OutputName::as_str), Some("board"));
        assert_eq!(run.boards.len(), 1);
        assert_eq!(run.boards[0].0, TokenId("Tok1".into()));
        assert_eq!(run.failed, 2);
        assert_eq!(run.trader_count(), 1);
        assert_eq!(visited.len(), 3);
        assert_eq!(launcher.launches(), 4);
        assert_eq!(launcher.closes(), 4);
    }
}
