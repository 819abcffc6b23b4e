use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Placeholder written for metrics that were not on the page.
pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Market metrics read from the pair page; `None` means the label was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetrics {
    #[serde(rename = "priceUSD", serialize_with = "or_not_available")]
    pub price_usd: Option<String>,
    #[serde(rename = "priceWBNB", serialize_with = "or_not_available")]
    pub price_native: Option<String>,
    #[serde(serialize_with = "or_not_available")]
    pub liquidity: Option<String>,
    #[serde(serialize_with = "or_not_available")]
    pub fdv: Option<String>,
    #[serde(rename = "marketCap", serialize_with = "or_not_available")]
    pub market_cap: Option<String>,
}

fn or_not_available<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(NOT_AVAILABLE))
}

/// USD value, token amount and transaction count for one side of a trader's activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flow {
    pub usd: String,
    pub tokens: String,
    pub txns: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderRecord {
    pub rank: usize,
    pub address: String,
    pub address_url: String,
    pub bought: Flow,
    pub sold: Flow,
    pub pnl: String,
    pub unrealized: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a token's profit leaderboard from the ranking API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub trader_address: String,
    pub linked_wallet_address: Option<String>,
    pub realized_profit: f64,
    pub timestamp: i64,
}

/// A trending pair listed on the explorer home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRef {
    pub pair_address: String,
    pub chain_id: String,
}

/// Everything one run produced, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub project_name: String,
    #[serde(rename = "date", serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: PageMetrics,
    #[serde(rename = "topTraders")]
    pub traders: Vec<TraderRecord>,
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// ── Tests ──
