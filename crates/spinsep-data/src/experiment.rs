//! Persisted experiment records.
//!
//! An [`ExperimentResult`] holds the measured bitstring histogram of every
//! Trotter step that was executed for one problem instance. Bitstrings have
//! `2L` characters; character `i` is qubit `i`, qubits `0..L` are the
//! spin-up sites and `L..2L` the spin-down sites.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::parameters::FermiHubbardParameters;

/// Shot counts per measured bitstring.
///
/// Ordered by bitstring so that serialisation is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` shots of `bitstring`.
    pub fn add(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Shots recorded for `bitstring`.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no shots were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(bitstring, count)` in bitstring order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.add(bitstring, count);
        }
        counts
    }
}

/// Measurement outcome of one circuit with a fixed number of Trotter steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrotterRun {
    /// Number of Trotter steps applied before measurement.
    pub trotter_steps: usize,
    /// Measured histogram.
    pub counts: Counts,
    /// When the run finished, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl TrotterRun {
    /// Create a run without timestamp.
    pub fn new(trotter_steps: usize, counts: Counts) -> Self {
        Self {
            trotter_steps,
            counts,
            end_timestamp: None,
        }
    }
}

/// Immutable record of one experiment instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Human-readable name.
    pub name: String,
    /// Processor the data was taken on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    /// Problem instance.
    pub parameters: FermiHubbardParameters,
    /// One entry per executed Trotter step count.
    pub runs: Vec<TrotterRun>,
}

impl ExperimentResult {
    /// Create a record.
    pub fn new(
        name: impl Into<String>,
        parameters: FermiHubbardParameters,
        runs: Vec<TrotterRun>,
    ) -> Self {
        Self {
            name: name.into(),
            processor: None,
            parameters,
            runs,
        }
    }

    /// Trotter step counts in record order.
    pub fn steps(&self) -> Vec<usize> {
        self.runs.iter().map(|r| r.trotter_steps).collect()
    }

    /// The run with exactly `step` Trotter steps.
    pub fn run(&self, step: usize) -> Option<&TrotterRun> {
        self.runs.iter().find(|r| r.trotter_steps == step)
    }

    /// Check the record against its parameters.
    pub fn validate(&self) -> DataResult<()> {
        self.parameters.validate()?;
        let width = self.parameters.qubits_count();
        let mut seen = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            if seen.contains(&run.trotter_steps) {
                return Err(self.invalid(format!("duplicate step {}", run.trotter_steps)));
            }
            seen.push(run.trotter_steps);
            for (bitstring, _) in run.counts.iter() {
                if bitstring.len() != width || !bitstring.bytes().all(|b| b == b'0' || b == b'1')
                {
                    return Err(self.invalid(format!(
                        "step {}: bitstring '{bitstring}' is not {width} binary digits",
                        run.trotter_steps
                    )));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> DataError {
        DataError::InvalidExperiment {
            name: self.name.clone(),
            reason,
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> DataResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse and validate a record.
    pub fn from_json(json: &str) -> DataResult<Self> {
        let result: Self = serde_json::from_str(json)?;
        result.validate()?;
        Ok(result)
    }

    /// Read and validate a record from disk.
    pub fn load(path: &Path) -> DataResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        let result: Self = serde_json::from_str(&source).map_err(|e| DataError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        result.validate()?;
        debug!(
            name = %result.name,
            runs = result.runs.len(),
            path = %path.display(),
            "loaded experiment"
        );
        Ok(result)
    }

    /// Validate and write the record to disk.
    pub fn save(&self, path: &Path) -> DataResult<()> {
        self.validate()?;
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| DataError::io(path, e))
    }
}
