//! Error types for the plot crate.

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

use spinsep_analysis::{AnalysisError, Quantity};

/// Errors produced while rendering charts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlotError {
    /// Nothing to draw.
    #[error("No bundles to plot")]
    NoBundles,

    /// Bundles disagree on how many values a quantity has per step.
    #[error("Bundle '{bundle}' has {found} values per step of {quantity}, expected {expected}")]
    WidthMismatch {
        bundle: String,
        quantity: Quantity,
        expected: usize,
        found: usize,
    },

    /// A selected profile step is absent from a bundle.
    #[error("Step {step} is not part of bundle '{bundle}'")]
    MissingStep { step: usize, bundle: String },

    /// Backend or drawing failure.
    #[error("Render error: {0}")]
    Render(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(err.to_string())
    }
}

/// Result type for plot operations.
pub type PlotResult<T> = Result<T, PlotError>;
