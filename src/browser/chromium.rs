use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Handler;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{BrowserHandle, Launcher, Page, RawRow, Readiness};
use crate::error::{Result, ScrapeError};
use crate::settings::{BrowserSettings, TableLayout};

const IDLE_WINDOW_MS: u64 = 500;
const READY_POLL_MS: u64 = 100;
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// Starts a local Chromium over the DevTools protocol.
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn launch(&self, settings: &BrowserSettings) -> Result<Box<dyn BrowserHandle>> {
        let config = browser_config(settings).map_err(ScrapeError::LaunchFailure)?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::LaunchFailure(e.to_string()))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let page = match open_page(&browser, settings).await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ScrapeError::LaunchFailure(e.to_string()));
            }
        };

        Ok(Box::new(ChromeHandle {
            browser,
            page: Arc::new(ChromePage { inner: page }),
            handler_task,
            closed,
        }))
    }
}

fn browser_config(settings: &BrowserSettings) -> std::result::Result<BrowserConfig, String> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_secs(60))
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", settings.user_agent));

    if !settings.headless {
        builder = builder.with_head();
    }
    if settings.no_sandbox {
        builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
    }
    if let Some(exe) = &settings.executable {
        builder = builder.chrome_executable(exe);
    }
    builder.build()
}

async fn open_page(
    browser: &Browser,
    settings: &BrowserSettings,
) -> chromiumoxide::error::Result<chromiumoxide::Page> {
    let page = browser.new_page("about:blank").await?;
    if settings.stealth {
        page.enable_stealth_mode_with_agent(&settings.user_agent).await?;
    } else {
        page.execute(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await?;
    }
    Ok(page)
}

fn spawn_handler_task(
    mut handler: Handler,
    closed: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("CDP handler event error: {}", e);
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
}

pub struct ChromeHandle {
    browser: Browser,
    page: Arc<ChromePage>,
    handler_task: tokio::task::JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserHandle for ChromeHandle {
    fn page(&self) -> Arc<dyn Page> {
        self.page.clone()
    }

    async fn close(&mut self) -> Result<()> {
        let handler_gone = self.closed.load(Ordering::SeqCst);
        let graceful = !handler_gone && {
            match self.browser.close().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("CDP close failed: {}", e);
                    false
                }
            }
        };

        if needs_kill(handler_gone, graceful) {
            match self.browser.kill().await {
                Some(Err(e)) => warn!("Killing Chrome failed: {}", e),
                Some(Ok(())) => debug!("Chrome killed"),
                None => debug!("No Chrome child to kill"),
            }
        }

        match tokio::time::timeout(EXIT_WAIT, self.browser.wait()).await {
            Ok(Ok(status)) => debug!("Chrome exited: {:?}", status),
            Ok(Err(e)) => warn!("Waiting for Chrome exit failed: {}", e),
            Err(_) => warn!("Chrome still running after {}s", EXIT_WAIT.as_secs()),
        }
        self.handler_task.abort();
        Ok(())
    }
}

/// A browser we could not close over CDP must be killed before waiting on it.
fn needs_kill(handler_gone: bool, closed_gracefully: bool) -> bool {
    handler_gone || !closed_gracefully
}

pub struct ChromePage {
    inner: chromiumoxide::Page,
}

impl ChromePage {
    async fn eval<T: DeserializeOwned>(&self, js: String) -> Result<T> {
        let result = self
            .inner
            .evaluate(js)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(result.into_value::<T>()?)
    }
}

#[async_trait]
impl Page for ChromePage {
    /// Returns once the new document has committed, so readiness checks
    /// never run against the previous page.
    async fn navigate(&self, url: &str) -> Result<()> {
        self.inner
            .goto(NavigateParams::new(url))
            .await
            .map_err(|e| ScrapeError::Browser(format!("navigate {}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_until(&self, readiness: Readiness) -> Result<()> {
        let js = match readiness {
            Readiness::DomReady => dom_ready_script(),
            Readiness::NetworkIdle => network_idle_script(),
        };
        let _: bool = self.eval(js).await?;
        Ok(())
    }

    async fn element_texts(&self, selector: &str) -> Result<Vec<String>> {
        let js = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => el.textContent || '')",
            sel = js_str(selector)
        );
        self.eval(js).await
    }

    async fn click_element(&self, selector: &str, index: usize) -> Result<()> {
        let elements = self
            .inner
            .find_elements(selector)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        let element = elements.get(index).ok_or_else(|| {
            ScrapeError::Browser(format!("no element #{} for '{}'", index, selector))
        })?;
        element
            .click()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        let js = format!("document.querySelector({}) !== null", js_str(selector));
        self.eval(js).await
    }

    async fn table_rows(&self, layout: &TableLayout) -> Result<Vec<RawRow>> {
        self.eval(table_snapshot_script(layout)).await
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let js = format!(
            r#"(async () => {{
                const res = await fetch({url});
                return await res.json();
            }})()"#,
            url = js_str(url)
        );
        self.eval(js).await.map_err(|e| ScrapeError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn read_global(&self, name: &str) -> Result<serde_json::Value> {
        let js = format!("window[{}] ?? null", js_str(name));
        self.eval(js).await
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .inner
            .url()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn dom_ready_script() -> String {
    format!(
        r#"(async () => {{
            while (location.href === 'about:blank' || document.readyState === 'loading') {{
                await new Promise(r => setTimeout(r, {poll}));
            }}
            return true;
        }})()"#,
        poll = READY_POLL_MS
    )
}

// Resource-entry count stable for the idle window while readyState is complete.
fn network_idle_script() -> String {
    format!(
        r#"(async () => {{
            const idleMs = {idle};
            const interval = {poll};
            const count = () => {{
                try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }}
            }};
            let last = count();
            let stable = 0;
            while (stable < idleMs) {{
                await new Promise(r => setTimeout(r, interval));
                const cur = count();
                const loaded = location.href !== 'about:blank' && document.readyState === 'complete';
                if (loaded && cur === last) {{
                    stable += interval;
                }} else {{
                    stable = 0;
                }}
                last = cur;
            }}
            return true;
        }})()"#,
        idle = IDLE_WINDOW_MS,
        poll = READY_POLL_MS
    )
}

fn table_snapshot_script(layout: &TableLayout) -> String {
    let usd = serde_json::Value::from(layout.usd_selectors.clone()).to_string();
    format!(
        r#"(() => {{
            const usdSelectors = {usd};
            const text = el => (el?.textContent || '').trim();
            return Array.from(document.querySelectorAll({rows})).map(row => ({{
                links: Array.from(row.querySelectorAll({links})).map(a => a.href || ''),
                cells: Array.from(row.querySelectorAll({cells})).map(cell => ({{
                    text: text(cell),
                    usd: usdSelectors.map(sel => {{
                        const el = cell.querySelector(sel);
                        return el ? text(el) : null;
                    }}),
                    sub_values: Array.from(cell.querySelectorAll({sub})).map(text),
                }})),
            }}));
        }})()"#,
        usd = usd,
        rows = js_str(&layout.row_selector),
        links = js_str(&layout.link_selector),
        cells = js_str(&layout.cell_selector),
        sub = js_str(&layout.sub_value_selector),
    )
}
