//! Bulk import of reports from a JSON file.

use std::path::Path;

use anyhow::Context;
use tracing::warn;

use super::diesel_pool::DieselError;
use super::DieselReportRepository;
use crate::models::ReportInput;

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Read a JSON array of report inputs.
pub async fn load_seed_file(path: &Path) -> anyhow::Result<Vec<ReportInput>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse seed file {}", path.display()))
}

/// Create a report for every input that passes validation. Invalid entries are skipped.
pub async fn import_reports(
    repo: &DieselReportRepository,
    inputs: Vec<ReportInput>,
) -> Result<SeedSummary, DieselError> {
    let mut summary = SeedSummary::default();

    for (index, input) in inputs.into_iter().enumerate() {
        match input.into_fields() {
            Ok(fields) => {
                repo.create(&fields).await?;
                summary.imported += 1;
            }
            Err(e) => {
                warn!("Skipping seed entry {}: {}", index, e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
