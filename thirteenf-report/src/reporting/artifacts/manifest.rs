//! Report manifest export (JSON).

use serde::{Deserialize, Serialize};
use thirteenf_core::fingerprint::{ConfigHash, DatasetHash};
use thirteenf_core::DateWindow;

use crate::pipeline::ReportOutput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowManifest {
    pub name: String,
    pub range: DateWindow,
    pub panel_rows: usize,
    pub panel_hash: DatasetHash,
    pub periods: Vec<DateWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub config_hash: ConfigHash,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub windows: Vec<WindowManifest>,
    pub series: Vec<String>,
}

impl ReportManifest {
    pub fn from_output(output: &ReportOutput) -> Self {
        Self {
            config_hash: output.config_hash.clone(),
            generated_at: output.generated_at,
            windows: output
                .windows
                .iter()
                .map(|w| WindowManifest {
                    name: w.name.clone(),
                    range: w.range,
                    panel_rows: w.fingerprint.rows,
                    panel_hash: w.fingerprint.hash.clone(),
                    periods: w.summaries.periods().collect(),
                })
                .collect(),
            series: output
                .series
                .iter()
                .map(|s| s.kind.file_stem().to_string())
                .collect(),
        }
    }
}
