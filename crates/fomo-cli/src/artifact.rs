//! JSON run artifact written after every run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use fomo_core::RunReport;

/// `news-analysis-YYYY-MM-DD-HH-MM.json`, stamped with the run's finish time.
pub(crate) fn artifact_file_name(finished_at: DateTime<Utc>) -> String {
    format!("news-analysis-{}.json", finished_at.format("%Y-%m-%d-%H-%M"))
}

/// Serialize `report` into `dir`, creating the directory if needed.
pub(crate) fn write_artifact(dir: &Path, report: &RunReport) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(artifact_file_name(report.finished_at));
    let body = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write artifact {}", path.display()))?;

    Ok(path)
}
