//! Export: JSON output of analysis reports.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnalysisError, AnalysisResult};
use crate::report::AnalysisReport;

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Export an analysis report to a JSON string.
pub fn to_json(report: &AnalysisReport, config: &ExportConfig) -> AnalysisResult<String> {
    let json = if config.pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

/// Export an analysis report to a JSON file.
pub fn to_file(report: &AnalysisReport, path: &Path, config: &ExportConfig) -> AnalysisResult<()> {
    let mut json = to_json(report, config)?;
    json.push('\n');
    std::fs::write(path, json).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a report back from a JSON file.
pub fn from_file(path: &Path) -> AnalysisResult<AnalysisReport> {
    let json = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}
