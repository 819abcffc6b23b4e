//! In-memory [`Page`] and [`Launcher`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{BrowserHandle, Launcher, Page, RawRow, Readiness};
use crate::error::{Result, ScrapeError};
use crate::settings::{BrowserSettings, TableLayout};

/// A rendered page as plain data. Deserializes from JSON page fixtures.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct FakePage {
    /// How long `wait_until` takes to resolve.
    #[serde(skip)]
    pub load: Duration,
    pub texts: HashMap<String, Vec<String>>,
    pub present: Vec<String>,
    pub rows: Vec<RawRow>,
    pub json: HashMap<String, serde_json::Value>,
    pub globals: HashMap<String, serde_json::Value>,
    #[serde(skip)]
    pub clicks: Mutex<Vec<(String, usize)>>,
    #[serde(skip)]
    pub visited: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn slow(mut self, load: Duration) -> Self {
        self.load = load;
        self
    }

    pub fn with_texts(mut self, selector: &str, texts: &[&str]) -> Self {
        self.texts
            .insert(selector.to_string(), texts.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_element(mut self, selector: &str) -> Self {
        self.present.push(selector.to_string());
        self
    }

    pub fn with_json(mut self, url: &str, body: serde_json::Value) -> Self {
        self.json.insert(url.to_string(), body);
        self
    }

    pub fn clicks(&self) -> Vec<(String, usize)> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Page for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn wait_until(&self, _readiness: Readiness) -> Result<()> {
        tokio::time::sleep(self.load).await;
        Ok(())
    }

    async fn element_texts(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self.texts.get(selector).cloned().unwrap_or_default())
    }

    async fn click_element(&self, selector: &str, index: usize) -> Result<()> {
        self.clicks.lock().unwrap().push((selector.to_string(), index));
        Ok(())
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        Ok(self.present.iter().any(|s| s == selector))
    }

    async fn table_rows(&self, _layout: &TableLayout) -> Result<Vec<RawRow>> {
        Ok(self.rows.clone())
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        self.json.get(url).cloned().ok_or_else(|| ScrapeError::FetchFailed {
            url: url.to_string(),
            reason: "404".into(),
        })
    }

    async fn read_global(&self, name: &str) -> Result<serde_json::Value> {
        Ok(self.globals.get(name).cloned().unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.visited.lock().unwrap().last().cloned().unwrap_or_default())
    }
}

/// Hands out one shared [`FakePage`] and counts launches and closes.
pub struct FakeLauncher {
    pub page: Arc<FakePage>,
    pub launches: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(page),
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct FakeHandle {
    page: Arc<FakePage>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserHandle for FakeHandle {
    fn page(&self) -> Arc<dyn Page> {
        self.page.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self, _settings: &BrowserSettings) -> Result<Box<dyn BrowserHandle>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScrapeError::LaunchFailure("no chrome".into()));
        }
        Ok(Box::new(FakeHandle {
            page: Arc::clone(&self.page),
            closes: Arc::clone(&self.closes),
        }))
    }
}
