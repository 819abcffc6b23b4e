//! Headless-browser scraper for DEX analytics pages.
//!
//! The main flow opens a pair page, reveals its top-traders leaderboard, and
//! writes the page metrics and trader rows to a JSON file. [`gmgn`] reads
//! token rankings through an in-page fetch, and [`pairs`] lists trending
//! pairs from the explorer home page.

pub mod artifact;
pub mod browser;
pub mod error;
pub mod extract;
pub mod gmgn;
pub mod locator;
pub mod model;
pub mod navigator;
pub mod pairs;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod target;

pub use error::{Notice, Result, ScrapeError};
pub use pipeline::{RunOutcome, TraderScraper};
pub use settings::Settings;
