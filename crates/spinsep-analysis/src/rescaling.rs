//! Shared rescaling of measured densities.
//!
//! Noise contracts measured densities towards the mean filling. The
//! per-step contraction `s_k` is estimated from each bundle against its
//! exact numerics and modelled as `s(k) = intercept + slope · k`. Fitting
//! all bundles of one device jointly gives a single rescaling, so bundles
//! are compared on the same scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bundle::InstanceBundle;
use crate::error::{AnalysisError, AnalysisResult};

/// Scale factor as a linear function of the Trotter step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rescaling {
    pub intercept: f64,
    pub slope: f64,
}

impl Rescaling {
    /// A step-independent factor.
    pub fn constant(value: f64) -> Self {
        Self {
            intercept: value,
            slope: 0.0,
        }
    }

    /// Factor at `step`.
    pub fn at(&self, step: usize) -> f64 {
        self.intercept + self.slope * step as f64
    }
}

impl fmt::Display for Rescaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} {:+.4}·k", self.intercept, self.slope)
    }
}

/// Fitting criterion turning `(step, scaling)` points into a [`Rescaling`].
pub trait RescalingStrategy: fmt::Debug + Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Fit the points; fails when there are none.
    fn fit(&self, points: &[(usize, f64)]) -> AnalysisResult<Rescaling>;
}

/// Ordinary least squares of scaling against step. Falls back to the mean
/// when every point has the same step.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearFit;

/// Mean scaling, independent of step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantFit;

fn mean_scaling(points: &[(usize, f64)]) -> AnalysisResult<f64> {
    if points.is_empty() {
        return Err(AnalysisError::DegenerateRescaling(
            "no scaling points to fit".into(),
        ));
    }
    Ok(points.iter().map(|&(_, s)| s).sum::<f64>() / points.len() as f64)
}

fn finite(rescaling: Rescaling) -> AnalysisResult<Rescaling> {
    if rescaling.intercept.is_finite() && rescaling.slope.is_finite() {
        Ok(rescaling)
    } else {
        Err(AnalysisError::DegenerateRescaling(format!(
            "fit is not finite: {rescaling:?}"
        )))
    }
}

impl RescalingStrategy for LinearFit {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn fit(&self, points: &[(usize, f64)]) -> AnalysisResult<Rescaling> {
        let mean_s = mean_scaling(points)?;
        let n = points.len() as f64;
        let mean_k = points.iter().map(|&(k, _)| k as f64).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for &(k, s) in points {
            let dk = k as f64 - mean_k;
            sxx += dk * dk;
            sxy += dk * (s - mean_s);
        }
        if sxx == 0.0 {
            return finite(Rescaling::constant(mean_s));
        }
        let slope = sxy / sxx;
        finite(Rescaling {
            intercept: mean_s - slope * mean_k,
            slope,
        })
    }
}

impl RescalingStrategy for ConstantFit {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn fit(&self, points: &[(usize, f64)]) -> AnalysisResult<Rescaling> {
        finite(Rescaling::constant(mean_scaling(points)?))
    }
}

/// Strategy selector used by configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Linear,
    Constant,
}

impl StrategyKind {
    pub fn strategy(self) -> Box<dyn RescalingStrategy> {
        match self {
            StrategyKind::Linear => Box::new(LinearFit),
            StrategyKind::Constant => Box::new(ConstantFit),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

impl FromStr for StrategyKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(StrategyKind::Linear),
            "constant" => Ok(StrategyKind::Constant),
            other => Err(AnalysisError::Config(format!(
                "unknown rescaling strategy '{other}'"
            ))),
        }
    }
}

/// Fit one rescaling to the scaling points of every bundle jointly.
///
/// Every bundle must have its exact numerics cached. The bundles are
/// treated as exchangeable evidence for one device-wide scale.
pub fn find_bundles_rescalings(
    bundles: &[InstanceBundle],
    strategy: &dyn RescalingStrategy,
) -> AnalysisResult<Rescaling> {
    if bundles.is_empty() {
        return Err(AnalysisError::EmptyBundle);
    }
    let mut points = Vec::new();
    for bundle in bundles {
        let bundle_points = bundle.scaling_points()?;
        debug!(
            bundle = bundle.name(),
            points = bundle_points.len(),
            "collected scaling points"
        );
        points.extend(bundle_points);
    }
    let rescaling = strategy.fit(&points)?;
    info!(
        strategy = strategy.name(),
        bundles = bundles.len(),
        points = points.len(),
        %rescaling,
        "resolved shared rescaling"
    );
    Ok(rescaling)
}

/// Store `rescaling` in every bundle.
pub fn apply_rescalings_to_bundles(rescaling: &Rescaling, bundles: &mut [InstanceBundle]) {
    for bundle in bundles {
        bundle.set_rescaling(*rescaling);
    }
}
