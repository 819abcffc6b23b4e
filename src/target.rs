use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{Result, ScrapeError};

static OUTPUT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// File stem for the output artifact. Only `[A-Za-z0-9_-]`, so it can never
/// escape the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName(String);

impl OutputName {
    pub fn parse(name: &str) -> Result<Self> {
        if OUTPUT_NAME_RE.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(ScrapeError::InvalidInput(format!(
                "invalid file name '{}': use letters, digits, '_' or '-'",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated page to scrape and where to save the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTarget {
    url: Url,
    output: OutputName,
}

impl ExtractionTarget {
    pub fn new(url: &str, output_name: &str, supported_hosts: &[String]) -> Result<Self> {
        let output = OutputName::parse(output_name.trim())?;
        let url = parse_page_url(url.trim(), supported_hosts)?;
        Ok(Self { url, output })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn output(&self) -> &OutputName {
        &self.output
    }
}

fn parse_page_url(raw: &str, supported_hosts: &[String]) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ScrapeError::InvalidInput(format!("invalid URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScrapeError::InvalidInput(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            raw
        )));
    }

    let host = url.host_str().unwrap_or_default();
    if !supported_hosts.is_empty() && !supported_hosts.iter().any(|h| host_matches(host, h)) {
        return Err(ScrapeError::InvalidInput(format!(
            "unsupported site '{}' (expected one of: {})",
            host,
            supported_hosts.join(", ")
        )));
    }

    Ok(url)
}

fn host_matches(host: &str, allowed: &str) -> bool {
    host == allowed
        || host
            .strip_suffix(allowed)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["dexscreener.com".into()]
    }

    #[test]
    fn accepts_plain_names() {
        for name in ["pepe", "PEPE_bsc-01", "_", "-"] {
            assert!(OutputName::parse(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_traversal_and_odd_chars() {
        for name in ["", "../etc/passwd", "a/b", "a.json", "name with space", "päpe", "a\\b"] {
            assert!(
                matches!(OutputName::parse(name), Err(ScrapeError::InvalidInput(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn target_checks_url() {
        let t =
            ExtractionTarget::new("https://dexscreener.com/bsc/0xabc", "pepe", &hosts()).unwrap();
        assert_eq!(t.output().file_name(), "pepe.json");

        let www = "https://www.dexscreener.com/solana/x";
        assert!(ExtractionTarget::new(www, "a", &hosts()).is_ok());
        assert!(ExtractionTarget::new("ftp://dexscreener.com/x", "a", &hosts()).is_err());
        assert!(ExtractionTarget::new("dexscreener.com/x", "a", &hosts()).is_err());
        assert!(ExtractionTarget::new("https://evil-dexscreener.com/x", "a", &hosts()).is_err());
    }

    #[test]
    fn empty_host_list_allows_any_site() {
        assert!(ExtractionTarget::new("https://example.org/pair", "a", &[]).is_ok());
    }
}
