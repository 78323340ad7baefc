//! Export orchestrator: build the report, then persist every artifact.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::ReportConfig;
use crate::pipeline::{build_report, ReportOutput};
use crate::reporting::artifacts::{ArtifactManager, ArtifactPaths};

pub fn export_report(output_dir: impl AsRef<Path>, output: &ReportOutput) -> Result<ArtifactPaths> {
    let manager = ArtifactManager::new(output_dir)?;
    let paths = manager.save(output)?;
    info!(
        report = %paths.report_tex.display(),
        tables = paths.tables.len(),
        "report exported"
    );
    Ok(paths)
}

/// Run the full pipeline for `config` and write its artifacts to
/// `config.output_dir`.
pub fn build_and_export(config: &ReportConfig) -> Result<(ReportOutput, ArtifactPaths)> {
    let output = build_report(config).context("Failed to build report")?;
    let paths = export_report(&config.output_dir, &output)?;
    Ok((output, paths))
}
