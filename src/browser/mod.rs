//! Capability surface over a live browser page.
//!
//! The extraction pipeline only ever talks to [`Page`] and [`Launcher`]; the
//! Chrome DevTools implementation lives in [`chromium`], and tests plug in
//! the in-memory pages from `fake` (also exported under the `test-util`
//! feature) that replay fixture snapshots.

pub mod chromium;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::{BrowserSettings, TableLayout};

pub use chromium::ChromeLauncher;
pub use session::{with_session, Session};

/// Page state a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// Markup parsed; enough when the first response already carries the data.
    DomReady,
    /// Load complete and background requests have settled.
    NetworkIdle,
}

/// One leaderboard row flattened out of the DOM, in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRow {
    /// Resolved `href` of every link in the row.
    pub links: Vec<String>,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCell {
    /// Trimmed `textContent` of the whole cell.
    pub text: String,
    /// Text of the first match of each USD selector, same order as the layout.
    pub usd: Vec<Option<String>>,
    /// Trimmed text of every sub-value span.
    pub sub_values: Vec<String>,
}

/// Primitive operations the extractors need from a rendered page.
#[async_trait]
pub trait Page: Send + Sync {
    /// Start navigating to `url`. Returns once the request is committed.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Block until the page reaches `readiness`. Callers bound this with a timeout.
    async fn wait_until(&self, readiness: Readiness) -> Result<()>;

    /// `textContent` of every element matching `selector`, in document order.
    async fn element_texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Click the `index`-th element matching `selector`.
    async fn click_element(&self, selector: &str, index: usize) -> Result<()>;

    async fn has_element(&self, selector: &str) -> Result<bool>;

    /// Snapshot the leaderboard rows described by `layout`.
    async fn table_rows(&self, layout: &TableLayout) -> Result<Vec<RawRow>>;

    /// `fetch(url)` from inside the page and return the parsed JSON body.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value>;

    /// Read a `window` global as JSON; `Null` when undefined.
    async fn read_global(&self, name: &str) -> Result<serde_json::Value>;

    async fn current_url(&self) -> Result<String>;
}

/// A running browser that owns exactly one working page.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    fn page(&self) -> Arc<dyn Page>;

    /// Terminate the browser process.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, settings: &BrowserSettings) -> Result<Box<dyn BrowserHandle>>;
}
