//! Error types for the sim crate.

use thiserror::Error;

use spinsep_data::DataError;

/// Errors produced by reference simulation and synthetic sampling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// The state vector would exceed the supported width.
    #[error("Problem needs {qubits} qubits, state-vector simulation supports at most {max}")]
    TooManyQubits {
        /// Qubits required (two per site).
        qubits: usize,
        /// Supported maximum.
        max: usize,
    },

    /// Problem parameters failed validation.
    #[error("Invalid parameters: {0}")]
    Parameters(#[from] DataError),

    /// Sampling configuration is out of range.
    #[error("Invalid sampling configuration: {0}")]
    InvalidSampling(String),

    /// A linear-algebra step produced a non-finite result.
    #[error("Numerical failure: {0}")]
    Numerics(String),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
