//! Analysis report structure.
//!
//! The top-level report combining every bundle's quantities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bundle::InstanceBundle;
use crate::config::AnalysisConfig;
use crate::error::AnalysisResult;
use crate::quantity::{Quantity, QuantityData};
use crate::rescaling::Rescaling;
use crate::reproducibility::ReproducibilityInfo;

/// Schema version of [`AnalysisReport`].
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Complete analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Timestamp of the analysis.
    pub timestamp: DateTime<Utc>,
    /// Configuration used.
    pub config: AnalysisConfig,
    /// Rescaling shared by all bundles, if one was resolved.
    pub shared_rescaling: Option<Rescaling>,
    /// Per-bundle results.
    pub bundles: Vec<BundleReport>,
    /// Reproducibility information.
    pub reproducibility: ReproducibilityInfo,
}

/// Results of one bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleReport {
    pub name: String,
    pub sites_count: usize,
    pub particles_up: usize,
    pub particles_down: usize,
    pub dt: f64,
    pub layouts: Vec<String>,
    pub instances: usize,
    pub steps: Vec<usize>,
    pub rescale_steps: Vec<usize>,
    /// Transform applied before simulating the reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerics_transform: Option<String>,
    /// Rescaling the rescaled quantities were computed with.
    pub rescaling: Rescaling,
    pub quantities: Vec<QuantityData>,
}

impl BundleReport {
    /// Evaluate `quantities` on `bundle`.
    pub fn from_bundle(bundle: &InstanceBundle, quantities: &[Quantity]) -> AnalysisResult<Self> {
        let params = bundle.parameters();
        Ok(Self {
            name: bundle.name().to_string(),
            sites_count: params.sites_count(),
            particles_up: params.particles_up(),
            particles_down: params.particles_down(),
            dt: params.dt,
            layouts: bundle.layouts().into_iter().map(String::from).collect(),
            instances: bundle.instances_count(),
            steps: bundle.steps().to_vec(),
            rescale_steps: bundle.rescale_steps().to_vec(),
            numerics_transform: bundle.numerics_transform().map(|t| t.name()),
            rescaling: bundle.effective_rescaling()?,
            quantities: quantities
                .iter()
                .map(|&q| bundle.quantity(q))
                .collect::<AnalysisResult<_>>()?,
        })
    }

    /// Data of one quantity, if it was evaluated.
    pub fn quantity(&self, quantity: Quantity) -> Option<&QuantityData> {
        self.quantities.iter().find(|q| q.quantity == quantity)
    }
}
