//! `spinsep-analysis` — bundles, quantities and rescaling for Fermi-Hubbard
//! spin-charge separation experiments.
//!
//! # Overview
//!
//! ```text
//! [ExperimentResult files] -> InstanceBundle (per problem instance)
//!                                  |
//!                                  v
//!                     NumericsCache -> exact numerics
//!                                  |
//!                                  v
//!                    find_bundles_rescalings (shared fit)
//!                                  |
//!                                  v
//!                   apply_rescalings_to_bundles
//!                                  |
//!                                  v
//!                  quantities -> AnalysisReport (JSON)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use spinsep_analysis::{
//!     InstanceBundle, LinearFit, NumericsCache, Quantity, apply_rescalings_to_bundles,
//!     find_bundles_rescalings,
//! };
//! use spinsep_data::{group_compatible, load_dataset};
//!
//! let dataset = load_dataset(std::path::Path::new("data")).unwrap();
//! let mut cache = NumericsCache::new();
//! let mut bundles = Vec::new();
//! for group in dataset.into_groups() {
//!     for experiments in group_compatible(group.experiments) {
//!         let mut bundle = InstanceBundle::new(experiments).unwrap();
//!         bundle.cache_exact_numerics(&mut cache, None).unwrap();
//!         bundles.push(bundle);
//!     }
//! }
//! let rescaling = find_bundles_rescalings(&bundles, &LinearFit).unwrap();
//! apply_rescalings_to_bundles(&rescaling, &mut bundles);
//! let spreading = bundles[0].quantity(Quantity::ChargeSpinSpreading).unwrap();
//! println!("{:?}", spreading.series("charge").map(|s| &s.mean));
//! ```

pub mod bundle;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod quantity;
pub mod report;
pub mod reproducibility;
pub mod rescaling;
mod stats;
pub mod transform;

pub use bundle::{InstanceBundle, InstanceBundleBuilder};
pub use cache::NumericsCache;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use quantity::{ErrorBand, Quantity, QuantityData, Series};
pub use report::{AnalysisReport, BundleReport};
pub use rescaling::{
    ConstantFit, LinearFit, Rescaling, RescalingStrategy, StrategyKind,
    apply_rescalings_to_bundles, find_bundles_rescalings,
};
pub use transform::{NumericsTransform, ParasiticCphaseCompensation};

use std::sync::Arc;

use spinsep_data::{Dataset, ExperimentResult, group_compatible};
use spinsep_sim::Progress;
use tracing::info;

use reproducibility::ReproducibilityInfo;

/// Observer of the reference simulations run by [`Analyzer::analyze`].
///
/// `step_completed` fires only for bundles whose reference is actually
/// simulated; cache hits go straight from `bundle_started` to
/// `bundle_finished`.
pub trait AnalysisProgress {
    fn bundle_started(&mut self, _bundle: &InstanceBundle) {}

    fn step_completed(&mut self, _progress: Progress) {}

    fn bundle_finished(&mut self, _bundle: &InstanceBundle) {}
}

/// Runs the configured analysis over a dataset.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer with the given configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Bundle one set of physically equivalent experiments.
    pub fn bundle(
        &self,
        experiments: Vec<ExperimentResult>,
        name: impl Into<String>,
    ) -> AnalysisResult<InstanceBundle> {
        let mut builder = InstanceBundle::builder(experiments)
            .with_name(name)
            .with_strategy(self.config.strategy);
        if let Some(steps) = &self.config.steps {
            builder = builder.with_steps(steps.clone());
        }
        if let Some(rescale_steps) = &self.config.rescale_steps {
            builder = builder.with_rescale_steps(rescale_steps.clone());
        }
        if let Some(angle) = self.config.parasitic_cphase {
            let transform = ParasiticCphaseCompensation::new(angle);
            builder = builder.with_numerics_transform(Arc::new(transform));
        }
        builder.build()
    }

    /// One bundle per compatible set of experiments in every dataset group,
    /// named after the group label.
    pub fn build_bundles(&self, dataset: Dataset) -> AnalysisResult<Vec<InstanceBundle>> {
        let mut bundles = Vec::new();
        for group in dataset.into_groups() {
            let sets = group_compatible(group.experiments);
            let numbered = sets.len() > 1;
            for (index, experiments) in sets.into_iter().enumerate() {
                let name = if numbered {
                    format!("u={} #{}", group.label, index + 1)
                } else {
                    format!("u={}", group.label)
                };
                bundles.push(self.bundle(experiments, name)?);
            }
        }
        if bundles.is_empty() {
            return Err(AnalysisError::EmptyBundle);
        }
        info!(bundles = bundles.len(), "built instance bundles");
        Ok(bundles)
    }

    /// Fit and apply the shared rescaling when configured. Bundles keep
    /// their own fits otherwise.
    pub fn resolve_rescaling(
        &self,
        bundles: &mut [InstanceBundle],
    ) -> AnalysisResult<Option<Rescaling>> {
        if !self.config.shared_rescaling {
            return Ok(None);
        }
        let strategy = self.config.strategy.strategy();
        let rescaling = find_bundles_rescalings(bundles, strategy.as_ref())?;
        apply_rescalings_to_bundles(&rescaling, bundles);
        Ok(Some(rescaling))
    }

    /// Evaluate the configured quantities on every bundle.
    pub fn report(
        &self,
        bundles: &[InstanceBundle],
        shared_rescaling: Option<Rescaling>,
        reproducibility: ReproducibilityInfo,
    ) -> AnalysisResult<AnalysisReport> {
        let bundle_reports = bundles
            .iter()
            .map(|b| BundleReport::from_bundle(b, &self.config.quantities))
            .collect::<AnalysisResult<Vec<_>>>()?;
        Ok(AnalysisReport {
            schema_version: report::SCHEMA_VERSION.into(),
            timestamp: chrono::Utc::now(),
            config: self.config.clone(),
            shared_rescaling,
            bundles: bundle_reports,
            reproducibility,
        })
    }

    /// Bundle, simulate, rescale and report in one go.
    pub fn analyze(
        &self,
        dataset: Dataset,
        cache: &mut NumericsCache,
        cli_args: &[String],
        mut progress: Option<&mut dyn AnalysisProgress>,
    ) -> AnalysisResult<(Vec<InstanceBundle>, AnalysisReport)> {
        let root = dataset.root().display().to_string();
        let mut bundles = self.build_bundles(dataset)?;
        let before = cache.computations();
        for bundle in &mut bundles {
            match progress.as_mut() {
                Some(observer) => {
                    observer.bundle_started(bundle);
                    let mut step = |p: Progress| observer.step_completed(p);
                    bundle.cache_exact_numerics(cache, Some(&mut step))?;
                    observer.bundle_finished(bundle);
                }
                None => bundle.cache_exact_numerics(cache, None)?,
            }
        }
        let shared = self.resolve_rescaling(&mut bundles)?;
        let reproducibility = ReproducibilityInfo::capture(cli_args)
            .with_data_root(root)
            .with_reference_simulations(cache.computations() - before);
        let report = self.report(&bundles, shared, reproducibility)?;
        Ok((bundles, report))
    }
}
