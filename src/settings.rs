use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::locator::TextMatch;

const ENV_PREFIX: &str = "DEXSCRAPE";
const DEFAULT_CONFIG_FILE: &str = "dex_traders";

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub browser: BrowserSettings,
    pub timeouts: Timeouts,
    pub settle: SettleDelays,
    pub site: SiteProfile,
    pub gmgn: GmgnSettings,
    pub pairs: PairSettings,
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
            site: SiteProfile::default(),
            gmgn: GmgnSettings::default(),
            pairs: PairSettings::default(),
            output_dir: ".".into(),
        }
    }
}

impl Settings {
    /// Layer built-in defaults, an optional TOML file and env vars such as
    /// `DEXSCRAPE_BROWSER__HEADLESS=false`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_source())
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub no_sandbox: bool,
    pub stealth: bool,
    pub user_agent: String,
    pub executable: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            stealth: true,
            user_agent: CHROME_USER_AGENT.to_string(),
            executable: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub page_load_ms: u64,
    pub table_wait_ms: u64,
    pub api_page_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            table_wait_ms: 10_000,
            api_page_ms: 60_000,
            poll_interval_ms: 250,
        }
    }
}

impl Timeouts {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn table_wait(&self) -> Duration {
        Duration::from_millis(self.table_wait_ms)
    }

    pub fn api_page(&self) -> Duration {
        Duration::from_millis(self.api_page_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    pub base_ms: u64,
    pub jitter_ms: u64,
    pub click_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            base_ms: 2000,
            jitter_ms: 1000,
            click_ms: 1500,
        }
    }
}

/// Selectors, labels and column positions describing one target site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub supported_hosts: Vec<String>,
    pub control_selector: String,
    pub control_match: TextMatch,
    pub heading_selector: String,
    pub label_selector: String,
    pub metric_labels: MetricLabels,
    pub table: TableLayout,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            supported_hosts: vec!["dexscreener.com".into()],
            control_selector: "button".into(),
            control_match: TextMatch::contains("Top Traders"),
            heading_selector: "h2.chakra-heading".into(),
            label_selector: "span".into(),
            metric_labels: MetricLabels::default(),
            table: TableLayout::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricLabels {
    pub price_usd: String,
    pub price_native: String,
    pub liquidity: String,
    pub fdv: String,
    pub market_cap: String,
}

impl Default for MetricLabels {
    fn default() -> Self {
        Self {
            price_usd: "Price USD".into(),
            price_native: "Price".into(),
            liquidity: "Liquidity".into(),
            fdv: "FDV".into(),
            market_cap: "Mkt Cap".into(),
        }
    }
}

impl MetricLabels {
    pub fn all(&self) -> [&str; 5] {
        [
            &self.price_usd,
            &self.price_native,
            &self.liquidity,
            &self.fdv,
            &self.market_cap,
        ]
    }
}

/// Structure of the top-traders leaderboard. Class names on the target are
/// hashed, so cells are addressed by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub ready_selector: String,
    pub row_selector: String,
    pub cell_selector: String,
    pub link_selector: String,
    pub explorer_patterns: Vec<String>,
    pub usd_selectors: Vec<String>,
    pub sub_value_selector: String,
    pub columns: Columns,
    pub unknown_balance: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            ready_selector: "div.custom-1kikirr".into(),
            row_selector: "div.custom-1nvxwu0".into(),
            cell_selector: "div[class^='custom-']".into(),
            link_selector: "a".into(),
            explorer_patterns: vec!["solscan.io/account".into(), "bscscan.com/address".into()],
            usd_selectors: vec!["span.custom-dv3t8y".into(), "span.custom-rcecxm".into()],
            sub_value_selector: "span.custom-2ygcmq".into(),
            columns: Columns::default(),
            unknown_balance: "Unknown".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub bought: usize,
    pub sold: usize,
    pub pnl: usize,
    pub unrealized: usize,
    pub balance: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            bought: 3,
            sold: 4,
            pnl: 5,
            unrealized: 6,
            balance: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GmgnSettings {
    pub max_tokens: usize,
    pub rank_url: String,
    /// `{token}` is replaced with the token address.
    pub top_traders_url: String,
}

impl Default for GmgnSettings {
    fn default() -> Self {
        Self {
            max_tokens: 50,
            rank_url: "https://gmgn.ai/defi/quotation/v1/rank/sol/swaps/1h?orderby=swaps&direction=desc&filters[]=renounced&filters[]=frozen".into(),
            top_traders_url: "https://gmgn.ai/defi/quotation/v1/tokens/top_traders/sol/{token}?orderby=profit&direction=desc".into(),
        }
    }
}

impl GmgnSettings {
    pub fn top_traders_url_for(&self, token: &str) -> String {
        self.top_traders_url.replace("{token}", token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairSettings {
    pub home_url: String,
    pub server_data_global: String,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            home_url: "https://dexscreener.com/".into(),
            server_data_global: "__SERVER_DATA".into(),
        }
    }
}

// ── Tests ──
