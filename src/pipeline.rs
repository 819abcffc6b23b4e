//! The pair-page flow: navigate, reveal the leaderboard, read metrics and
//! rows, assemble the artifact.

use std::time::Duration;

use tracing::{info, warn};

use crate::artifact;
use crate::browser::{with_session, Launcher, Page, Readiness};
use crate::error::{Notice, Result, ScrapeError};
use crate::extract::{extract_labeled_fields, extract_trader_rows, project_name, wait_for_table};
use crate::locator::click_by_text;
use crate::model::{ExtractionResult, PageMetrics};
use crate::navigator::{goto, NavOptions, SettlePolicy};
use crate::settings::Settings;
use crate::target::ExtractionTarget;

/// Result of one run plus the non-fatal conditions met along the way.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: ExtractionResult,
    pub notices: Vec<Notice>,
}

pub struct TraderScraper<'a> {
    launcher: &'a dyn Launcher,
    settings: &'a Settings,
}

impl<'a> TraderScraper<'a> {
    pub fn new(launcher: &'a dyn Launcher, settings: &'a Settings) -> Self {
        Self { launcher, settings }
    }

    /// Validate raw input, then run. Bad input never reaches the browser.
    pub async fn scrape(
        &self,
        url: &str,
        output_name: &str,
    ) -> Result<(ExtractionTarget, RunOutcome)> {
        let target = ExtractionTarget::new(url, output_name, &self.settings.site.supported_hosts)?;
        let outcome = self.run(&target).await?;
        Ok((target, outcome))
    }

    pub async fn run(&self, target: &ExtractionTarget) -> Result<RunOutcome> {
        let url = target.url().to_string();
        with_session(self.launcher, &self.settings.browser, |page| async move {
            self.extract(page.as_ref(), &url).await
        })
        .await
    }

    async fn extract(&self, page: &dyn Page, url: &str) -> Result<RunOutcome> {
        let s = self.settings;
        let site = &s.site;
        let mut notices = Vec::new();

        info!("Opening project page...");
        let opts = NavOptions {
            readiness: Readiness::DomReady,
            timeout: s.timeouts.page_load(),
        };
        goto(page, url, opts).await?;
        SettlePolicy::from_settings(&s.settle).settle().await;

        info!("Clicking '{}' button...", site.control_match.text);
        let clicked = click_by_text(
            page,
            &site.control_selector,
            &site.control_match,
            Duration::from_millis(s.settle.click_ms),
        )
        .await?;
        if !clicked {
            return Err(ScrapeError::ControlNotFound(site.control_match.text.clone()));
        }

        let name = project_name(page, &site.heading_selector).await?;

        let labels = site.metric_labels.all();
        let fields = extract_labeled_fields(page, &site.label_selector, &labels).await?;
        for label in fields.missing() {
            warn!("Metric '{}' not found, recording N/A", label);
            notices.push(Notice::PartialFieldMiss(label.to_string()));
        }
        let metrics = PageMetrics::from_fields(&fields, &site.metric_labels);

        info!("Waiting for top traders table...");
        wait_for_table(
            page,
            &site.table.ready_selector,
            s.timeouts.table_wait(),
            s.timeouts.poll_interval(),
        )
        .await?;
        let traders = extract_trader_rows(page, &site.table).await?;
        if traders.is_empty() {
            warn!("No top traders found");
            notices.push(Notice::EmptyResultSet);
        }

        Ok(RunOutcome {
            result: artifact::build(name, metrics, traders),
            notices,
        })
    }
}

// ── Tests ──
