//! Analysis error types.

use std::path::PathBuf;

use thiserror::Error;

use spinsep_data::DataError;
use spinsep_sim::SimError;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while bundling, rescaling or exporting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// A bundle was built without experiments, or a resolver got no bundles.
    #[error("No experiments to analyse")]
    EmptyBundle,

    /// Experiments in one bundle describe different physics.
    #[error("Experiment '{name}' is not physically equivalent to '{reference}'")]
    IncompatibleExperiments {
        /// Offending experiment.
        name: String,
        /// First experiment of the bundle.
        reference: String,
    },

    /// A requested step is missing from an experiment or from the bundle.
    #[error("Trotter step {step} is not available in '{experiment}'")]
    UnknownStep {
        /// Requested step.
        step: usize,
        /// Experiment or bundle name.
        experiment: String,
    },

    /// A quantity needs the reference trajectory but it was never cached.
    #[error("Exact numerics not cached for bundle '{0}'")]
    NumericsNotCached(String),

    /// Post-selection removed every shot of a run.
    #[error("No shots survive post-selection at step {step} of '{experiment}'")]
    NoPostSelectedShots {
        /// Experiment name.
        experiment: String,
        /// Trotter step.
        step: usize,
    },

    /// Exact densities sit at the mean filling, so no scale can be fitted.
    #[error("Scaling undefined at step {step}: reference densities are flat")]
    DegenerateScaling {
        /// Trotter step.
        step: usize,
    },

    /// A rescaling could not be fitted or evaluates to a non-positive factor.
    #[error("Degenerate rescaling: {0}")]
    DegenerateRescaling(String),

    /// A quantity name is not in the catalog.
    #[error("Unknown quantity '{0}'")]
    UnknownQuantity(String),

    /// Analysis configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reference simulation failed.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// Experiment data failed to load or validate.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Report serialisation failed.
    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Export(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for AnalysisError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        AnalysisError::Config(e.to_string())
    }
}
