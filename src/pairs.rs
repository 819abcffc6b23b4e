//! Trending pairs from the explorer home page's server-rendered state.

use serde::Deserialize;
use tracing::info;

use crate::browser::{with_session, Launcher, Readiness};
use crate::error::{Result, ScrapeError};
use crate::model::PairRef;
use crate::navigator::{goto, NavOptions};
use crate::settings::Settings;

#[derive(Debug, Deserialize)]
struct ServerData {
    route: Route,
}

#[derive(Debug, Deserialize)]
struct Route {
    data: RouteData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteData {
    dex_screener_data: ScreenerData,
}

#[derive(Debug, Deserialize)]
struct ScreenerData {
    #[serde(default)]
    pairs: Vec<PairRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairRow {
    pair_address: String,
    chain_id: String,
}

pub async fn discover_pairs(launcher: &dyn Launcher, settings: &Settings) -> Result<Vec<PairRef>> {
    let home = settings.pairs.home_url.as_str();
    let global = settings.pairs.server_data_global.as_str();
    let opts = NavOptions {
        readiness: Readiness::NetworkIdle,
        timeout: settings.timeouts.page_load(),
    };

    let raw = with_session(launcher, &settings.browser, |page| async move {
        goto(page.as_ref(), home, opts).await?;
        page.read_global(global).await
    })
    .await?;

    project_pairs(raw).map_err(|reason| ScrapeError::FetchFailed {
        url: home.to_string(),
        reason,
    })
}

fn project_pairs(raw: serde_json::Value) -> std::result::Result<Vec<PairRef>, String> {
    if raw.is_null() {
        return Err("page state not found".into());
    }
    let data: ServerData =
        serde_json::from_value(raw).map_err(|e| format!("unexpected page state: {}", e))?;

    let pairs: Vec<PairRef> = data
        .route
        .data
        .dex_screener_data
        .pairs
        .into_iter()
        .map(|p| PairRef {
            pair_address: p.pair_address,
            chain_id: p.chain_id,
        })
        .collect();
    info!("Found {} trending pairs", pairs.len());
    Ok(pairs)
}

// ── Tests ──
