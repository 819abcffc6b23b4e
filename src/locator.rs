use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::browser::Page;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive substring.
    Contains,
    /// Trimmed text equals the target.
    Exact,
}

/// Text predicate used to pick a control when no stable selector exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub mode: MatchMode,
    pub text: String,
}

impl TextMatch {
    pub fn contains(text: &str) -> Self {
        Self {
            mode: MatchMode::Contains,
            text: text.to_string(),
        }
    }

    pub fn exact(text: &str) -> Self {
        Self {
            mode: MatchMode::Exact,
            text: text.to_string(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self.mode {
            MatchMode::Contains => candidate.contains(&self.text),
            MatchMode::Exact => candidate.trim() == self.text,
        }
    }
}

/// Index of the first item satisfying `predicate`. No scoring, first wins.
pub fn find_first_by_predicate<T, P>(items: &[T], predicate: P) -> Option<usize>
where
    P: Fn(&T) -> bool,
{
    items.iter().position(predicate)
}

/// Click the first `candidate_selector` element whose text satisfies `matcher`,
/// then wait `settle` for revealed content. `Ok(false)` when nothing matched.
pub async fn click_by_text(
    page: &dyn Page,
    candidate_selector: &str,
    matcher: &TextMatch,
    settle: Duration,
) -> Result<bool> {
    let texts = page.element_texts(candidate_selector).await?;
    debug!("{} '{}' candidates", texts.len(), candidate_selector);

    let Some(index) = find_first_by_predicate(&texts, |t| matcher.matches(t)) else {
        return Ok(false);
    };

    page.click_element(candidate_selector, index).await?;
    info!("Clicked '{}' ({} #{})", matcher.text, candidate_selector, index);
    tokio::time::sleep(settle).await;
    Ok(true)
}

// ── Tests ──
