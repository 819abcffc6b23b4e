use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("browser failed to launch: {0}")]
    LaunchFailure(String),

    #[error("navigation to {url} timed out after {elapsed_ms}ms")]
    NavigationTimeout { url: String, elapsed_ms: u64 },

    #[error("'{0}' control not found")]
    ControlNotFound(String),

    #[error("table container '{selector}' did not appear within {waited_ms}ms")]
    TableNotFound { selector: String, waited_ms: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("requested {requested} items, limit is {max}")]
    LimitExceeded { requested: usize, max: usize },

    #[error("fetch of {url} failed: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("browser call failed: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Non-fatal conditions absorbed into the data model during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A labeled metric was not on the page; its field is absent.
    PartialFieldMiss(String),
    /// The table rendered but produced no trader records.
    EmptyResultSet,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PartialFieldMiss(label) => write!(f, "metric '{}' not found on page", label),
            Notice::EmptyResultSet => write!(f, "no top traders found"),
        }
    }
}
