use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::info;

use crate::browser::{Page, Readiness};
use crate::error::{Result, ScrapeError};
use crate::settings::SettleDelays;

#[derive(Debug, Clone, Copy)]
pub struct NavOptions {
    pub readiness: Readiness,
    pub timeout: Duration,
}

/// Navigate and wait for `opts.readiness`, all under one deadline.
pub async fn goto(page: &dyn Page, url: &str, opts: NavOptions) -> Result<()> {
    let started = Instant::now();
    let reach = async {
        page.navigate(url).await?;
        page.wait_until(opts.readiness).await
    };

    match tokio::time::timeout(opts.timeout, reach).await {
        Ok(result) => {
            info!(
                "Loaded {} ({:?}) in {:.1}s",
                url,
                opts.readiness,
                started.elapsed().as_secs_f64()
            );
            result
        }
        Err(_) => Err(ScrapeError::NavigationTimeout {
            url: url.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }),
    }
}

/// Randomized pause after navigation: `base` plus up to `jitter`.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    pub base: Duration,
    pub jitter: Duration,
}

impl SettlePolicy {
    pub fn from_settings(s: &SettleDelays) -> Self {
        Self {
            base: Duration::from_millis(s.base_ms),
            jitter: Duration::from_millis(s.jitter_ms),
        }
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base + Duration::from_millis(extra)
    }

    pub async fn settle(&self) {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
    }
}

// ── Tests ──
