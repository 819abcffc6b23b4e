#![allow(dead_code)]

use dex_traders::browser::fake::FakePage;
use dex_traders::Settings;

/// Load a rendered-page snapshot from `tests/fixtures/<name>.json`.
pub fn load_fixture(name: &str) -> FakePage {
    let raw = std::fs::read_to_string(format!("tests/fixtures/{}.json", name)).unwrap();
    FakePage::from_json(&raw).unwrap()
}

/// Defaults with the settle delays zeroed so runs are deterministic.
pub fn test_settings() -> Settings {
    let mut s = Settings::default();
    s.settle.base_ms = 0;
    s.settle.jitter_ms = 0;
    s.settle.click_ms = 0;
    s
}
