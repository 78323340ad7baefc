//! Content fingerprints for cleaned panels and configurations.
//!
//! A panel fingerprint is the BLAKE3 hash of the frame serialized as CSV
//! (header included), so it changes with any column name, order or value.
//! Configuration hashes use canonical JSON.

use crate::reclassify::CleanedPanel;
use crate::domain::DateWindow;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 content hash of a frame, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BLAKE3 hash of a configuration's canonical JSON, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn of<T: Serialize>(config: &T) -> Result<Self, serde_json::Error> {
        // serde_json::Value keeps object keys sorted
        let canonical = serde_json::to_value(config)?;
        let json = serde_json::to_string(&canonical)?;
        Ok(Self(blake3::hash(json.as_bytes()).to_hex().to_string()))
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn fingerprint_frame(df: &DataFrame) -> PolarsResult<DatasetHash> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df.clone())?;
    Ok(DatasetHash(blake3::hash(&buf).to_hex().to_string()))
}

/// Fingerprint record for one cleaned panel, as written to the report manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelFingerprint {
    pub window: DateWindow,
    pub rows: usize,
    pub hash: DatasetHash,
}

impl PanelFingerprint {
    pub fn of(panel: &CleanedPanel) -> PolarsResult<Self> {
        Ok(Self {
            window: panel.window(),
            rows: panel.height(),
            hash: fingerprint_frame(panel.frame())?,
        })
    }
}
