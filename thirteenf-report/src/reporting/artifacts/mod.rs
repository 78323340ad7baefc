//! Artifact manager for persisting report outputs.
//!
//! Layout under the output directory:
//!
//! ```text
//! report.tex
//! paper.bib
//! manifest.json
//! tables/<window>/<period>.csv
//! series/{type_counts,aum_totals,manager_counts}.csv
//! ```

mod manifest;
mod series;
mod tables;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pipeline::ReportOutput;
use crate::reporting::latex::{render_document, BIBLIOGRAPHY};

pub use manifest::{ReportManifest, WindowManifest};
pub use series::series_csv;
pub use tables::summary_csv;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub report_tex: PathBuf,
    pub bibliography: PathBuf,
    pub manifest: PathBuf,
    pub tables: Vec<PathBuf>,
    pub series: Vec<PathBuf>,
}

/// Manages writing all artifacts for a report.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create artifact output directory")?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save complete report artifacts.
    pub fn save(&self, output: &ReportOutput) -> Result<ArtifactPaths> {
        let mut tables = Vec::new();
        for window in &output.windows {
            let dir = self.output_dir.join("tables").join(&window.name);
            for table in window.summaries.iter() {
                let path = dir.join(format!("{}.csv", table.period.slug()));
                write_atomic(&path, summary_csv(table)?.as_bytes())?;
                tables.push(path);
            }
        }

        let mut series = Vec::new();
        for s in &output.series {
            let path = self
                .output_dir
                .join("series")
                .join(format!("{}.csv", s.kind.file_stem()));
            write_atomic(&path, &series_csv(s)?)?;
            series.push(path);
        }

        let report_tex = self.output_dir.join("report.tex");
        write_atomic(&report_tex, render_document(output).as_bytes())?;

        let bibliography = self.output_dir.join("paper.bib");
        write_atomic(&bibliography, BIBLIOGRAPHY.as_bytes())?;

        let manifest = self.output_dir.join("manifest.json");
        let json = serde_json::to_string_pretty(&ReportManifest::from_output(output))
            .context("Failed to serialize report manifest")?;
        write_atomic(&manifest, json.as_bytes())?;

        debug!(
            dir = %self.output_dir.display(),
            tables = tables.len(),
            series = series.len(),
            "artifacts written"
        );

        Ok(ArtifactPaths {
            report_tex,
            bibliography,
            manifest,
            tables,
            series,
        })
    }
}

/// Write `contents` to a sibling temp file, then rename over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to move into place {}", path.display()));
    }
    Ok(())
}
