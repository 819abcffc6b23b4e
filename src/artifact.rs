use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::{ExtractionResult, PageMetrics, TraderRecord};
use crate::target::OutputName;

/// Assemble the run's output, stamped with the current UTC time.
pub fn build(
    project_name: String,
    metrics: PageMetrics,
    traders: Vec<TraderRecord>,
) -> ExtractionResult {
    build_at(project_name, metrics, traders, Utc::now())
}

pub fn build_at(
    project_name: String,
    metrics: PageMetrics,
    traders: Vec<TraderRecord>,
    timestamp: DateTime<Utc>,
) -> ExtractionResult {
    ExtractionResult {
        project_name,
        timestamp,
        metrics,
        traders,
    }
}

/// Write `<dir>/<name>.json` as pretty JSON, creating `dir` if needed.
pub fn write(result: &ExtractionResult, dir: &Path, name: &OutputName) -> Result<PathBuf> {
    let path = write_json(result, dir, name)?;
    info!("Saved {} traders to {}", result.traders.len(), path.display());
    Ok(path)
}

pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    dir: &Path,
    name: &OutputName,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name.file_name());
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

// ── Tests ──
