//! Reproducibility: CLI snapshot, versions and reference bookkeeping.
//!
//! Captures what is needed to rerun an analysis and get the same report.

use serde::{Deserialize, Serialize};

use crate::report::SCHEMA_VERSION;

/// Information for reproducing an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproducibilityInfo {
    /// spinsep version used.
    pub spinsep_version: String,
    /// CLI arguments of the run.
    pub cli_args: Vec<String>,
    /// Schema version of the report.
    pub schema_version: String,
    /// Data directory analysed, if read from disk.
    pub data_root: Option<String>,
    /// Reference simulations run to produce the report.
    pub reference_simulations: usize,
}

impl ReproducibilityInfo {
    /// Capture the current context.
    pub fn capture(cli_args: &[String]) -> Self {
        Self {
            spinsep_version: env!("CARGO_PKG_VERSION").to_string(),
            cli_args: cli_args.to_vec(),
            schema_version: SCHEMA_VERSION.into(),
            data_root: None,
            reference_simulations: 0,
        }
    }

    /// Record the analysed data directory.
    pub fn with_data_root(mut self, root: impl Into<String>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Record how many reference trajectories were simulated.
    pub fn with_reference_simulations(mut self, count: usize) -> Self {
        self.reference_simulations = count;
        self
    }
}
