//! Instance bundles: repeated runs of one problem on different layouts.
//!
//! A bundle averages the measured densities of physically equivalent
//! experiments, compares them with the cached exact numerics and exposes the
//! quantity catalog. Everything except [`InstanceBundle::cache_exact_numerics`]
//! and the rescaling setters is a pure function of the stored state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, info};

use spinsep_data::{ExperimentResult, FermiHubbardParameters, TrotterRun};
use spinsep_sim::{Progress, Trajectory};

use crate::cache::NumericsCache;
use crate::error::{AnalysisError, AnalysisResult};
use crate::quantity::{Basis, Observable, Quantity, QuantityData, Series};
use crate::rescaling::{Rescaling, StrategyKind};
use crate::stats;
use crate::transform::NumericsTransform;

/// Denominators below this make a scaling fit meaningless.
const SCALING_EPSILON: f64 = 1e-12;

/// Builder for [`InstanceBundle`].
#[derive(Debug)]
pub struct InstanceBundleBuilder {
    experiments: Vec<ExperimentResult>,
    steps: Option<Vec<usize>>,
    rescale_steps: Option<Vec<usize>>,
    transform: Option<Arc<dyn NumericsTransform>>,
    strategy: StrategyKind,
    name: Option<String>,
}

impl InstanceBundleBuilder {
    /// Restrict the bundle to these steps (default: steps common to all).
    pub fn with_steps(mut self, steps: Vec<usize>) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Steps whose scaling enters the rescaling fit (default: all steps).
    pub fn with_rescale_steps(mut self, steps: Vec<usize>) -> Self {
        self.rescale_steps = Some(steps);
        self
    }

    /// Transform the parameters before simulating the reference.
    pub fn with_numerics_transform(mut self, transform: Arc<dyn NumericsTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Strategy of the bundle's own rescaling fit (default: linear).
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Display name (default: name of the first experiment).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate the inputs and build the bundle.
    pub fn build(self) -> AnalysisResult<InstanceBundle> {
        let first = self.experiments.first().ok_or(AnalysisError::EmptyBundle)?;
        for experiment in &self.experiments {
            experiment.validate()?;
            if !experiment.parameters.physics_equivalent(&first.parameters) {
                return Err(AnalysisError::IncompatibleExperiments {
                    name: experiment.name.clone(),
                    reference: first.name.clone(),
                });
            }
        }
        let name = self.name.unwrap_or_else(|| first.name.clone());
        let parameters = first.parameters.clone();

        let steps = match self.steps {
            Some(steps) => sorted_unique(steps),
            None => common_steps(&self.experiments),
        };
        if steps.is_empty() {
            return Err(AnalysisError::EmptyBundle);
        }
        for experiment in &self.experiments {
            if let Some(&step) = steps.iter().find(|&&s| experiment.run(s).is_none()) {
                return Err(AnalysisError::UnknownStep {
                    step,
                    experiment: experiment.name.clone(),
                });
            }
        }

        let rescale_steps = match self.rescale_steps {
            Some(rescale) => sorted_unique(rescale),
            None => steps.clone(),
        };
        if let Some(&step) = rescale_steps.iter().find(|s| !steps.contains(s)) {
            return Err(AnalysisError::UnknownStep {
                step,
                experiment: name,
            });
        }

        let mut experiments: BTreeMap<String, Vec<ExperimentResult>> = BTreeMap::new();
        for experiment in self.experiments {
            experiments
                .entry(experiment.parameters.layout.label())
                .or_default()
                .push(experiment);
        }

        debug!(
            bundle = %name,
            layouts = experiments.len(),
            steps = steps.len(),
            "built instance bundle"
        );

        Ok(InstanceBundle {
            name,
            parameters,
            experiments,
            steps,
            rescale_steps,
            transform: self.transform,
            strategy: self.strategy,
            numerics: None,
            rescaling: None,
        })
    }
}

/// Physically equivalent experiments averaged as one problem instance.
#[derive(Debug, Clone)]
pub struct InstanceBundle {
    name: String,
    parameters: FermiHubbardParameters,
    experiments: BTreeMap<String, Vec<ExperimentResult>>,
    steps: Vec<usize>,
    rescale_steps: Vec<usize>,
    transform: Option<Arc<dyn NumericsTransform>>,
    strategy: StrategyKind,
    numerics: Option<Arc<Trajectory>>,
    rescaling: Option<Rescaling>,
}

/// Post-selected densities of one experiment, rows aligned with the steps.
struct Measurement {
    post_selection: Array1<f64>,
    up: Array2<f64>,
    down: Array2<f64>,
}

impl InstanceBundle {
    /// Start building a bundle from experiments of one problem.
    pub fn builder(experiments: Vec<ExperimentResult>) -> InstanceBundleBuilder {
        InstanceBundleBuilder {
            experiments,
            steps: None,
            rescale_steps: None,
            transform: None,
            strategy: StrategyKind::default(),
            name: None,
        }
    }

    /// Build a bundle with default steps and no transform.
    pub fn new(experiments: Vec<ExperimentResult>) -> AnalysisResult<Self> {
        Self::builder(experiments).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters of the measured problem (layout of the first experiment).
    pub fn parameters(&self) -> &FermiHubbardParameters {
        &self.parameters
    }

    /// Parameters the reference is simulated with.
    pub fn numerics_parameters(&self) -> FermiHubbardParameters {
        match &self.transform {
            Some(transform) => transform.apply(&self.parameters),
            None => self.parameters.clone(),
        }
    }

    pub fn numerics_transform(&self) -> Option<&Arc<dyn NumericsTransform>> {
        self.transform.as_ref()
    }

    /// Layout labels, sorted.
    pub fn layouts(&self) -> Vec<&str> {
        self.experiments.keys().map(String::as_str).collect()
    }

    /// Every experiment, grouped by layout.
    pub fn experiments(&self) -> impl Iterator<Item = &ExperimentResult> {
        self.experiments.values().flatten()
    }

    /// Number of averaged experiment instances.
    pub fn instances_count(&self) -> usize {
        self.experiments.values().map(Vec::len).sum()
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn rescale_steps(&self) -> &[usize] {
        &self.rescale_steps
    }

    /// Evolution time of every step.
    pub fn times(&self) -> Vec<f64> {
        self.steps
            .iter()
            .map(|&s| s as f64 * self.parameters.dt)
            .collect()
    }

    /// Cached reference trajectory, if any.
    pub fn exact_numerics(&self) -> Option<&Arc<Trajectory>> {
        self.numerics.as_ref()
    }

    /// Fetch the reference trajectory through `cache`.
    ///
    /// Does nothing when the bundle already holds its reference. `progress`
    /// is invoked once per step of an actual simulation and never on a
    /// cache hit. On failure nothing is stored.
    pub fn cache_exact_numerics(
        &mut self,
        cache: &mut NumericsCache,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> AnalysisResult<()> {
        if self.numerics.is_some() {
            debug!(bundle = %self.name, "exact numerics already cached");
            return Ok(());
        }
        let params = self.numerics_parameters();
        let transform = self.transform.as_ref().map(|t| t.name());
        let trajectory = cache.get_or_compute(&params, &self.steps, progress)?;
        info!(
            bundle = %self.name,
            steps = trajectory.steps.len(),
            transform = transform.as_deref().unwrap_or("none"),
            "exact numerics ready"
        );
        self.numerics = Some(trajectory);
        Ok(())
    }

    /// Shared rescaling applied to this bundle, if any.
    pub fn rescaling(&self) -> Option<&Rescaling> {
        self.rescaling.as_ref()
    }

    /// Store a shared rescaling.
    pub fn set_rescaling(&mut self, rescaling: Rescaling) {
        self.rescaling = Some(rescaling);
    }

    /// Revert to the bundle's own fit.
    pub fn clear_rescaling(&mut self) {
        self.rescaling = None;
    }

    /// Rescaling used for rescaled quantities: the applied one, or a fit of
    /// this bundle's own scaling over its rescale steps.
    pub fn effective_rescaling(&self) -> AnalysisResult<Rescaling> {
        match self.rescaling {
            Some(rescaling) => Ok(rescaling),
            None => self.strategy.strategy().fit(&self.scaling_points()?),
        }
    }

    /// `(step, scaling)` of the instance-averaged densities at every rescale
    /// step. Steps with a flat reference are skipped.
    pub fn scaling_points(&self) -> AnalysisResult<Vec<(usize, f64)>> {
        let (exact_up, exact_down) = self.exact()?;
        let measurements = self.measurements()?;
        let ups: Vec<_> = measurements.iter().map(|m| m.up.clone()).collect();
        let downs: Vec<_> = measurements.iter().map(|m| m.down.clone()).collect();
        let (mean_up, _, _) = stats::aggregate(&ups);
        let (mean_down, _, _) = stats::aggregate(&downs);
        let (nu_up, nu_down) = self.fillings();

        let mut points = Vec::with_capacity(self.rescale_steps.len());
        for &step in &self.rescale_steps {
            let row = self.row_of(step)?;
            let scaling = scaling_factor(
                step,
                [mean_up.row(row), mean_down.row(row)],
                [exact_up.row(row), exact_down.row(row)],
                [nu_up, nu_down],
            );
            match scaling {
                Ok(s) => points.push((step, s)),
                Err(AnalysisError::DegenerateScaling { step }) => {
                    debug!(bundle = %self.name, step, "skipping flat reference step");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(points)
    }

    /// Evaluate a quantity on every step of the bundle.
    ///
    /// The `scaling` quantity leaves out steps with a flat reference, the
    /// same steps [`InstanceBundle::scaling_points`] skips.
    pub fn quantity(&self, quantity: Quantity) -> AnalysisResult<QuantityData> {
        let measurements = self.measurements()?;
        let times = self.times();
        let mut scaled_rows: Option<Vec<usize>> = None;

        let series = match quantity.decompose() {
            None if quantity == Quantity::PostSelection => {
                let samples: Vec<_> = measurements
                    .iter()
                    .map(|m| column(m.post_selection.clone()))
                    .collect();
                vec![series("value", &samples, None)]
            }
            None => {
                let (exact_up, exact_down) = self.exact()?;
                let fillings = {
                    let (nu_up, nu_down) = self.fillings();
                    [nu_up, nu_down]
                };
                let rows: Vec<usize> = (0..self.steps.len())
                    .filter(|&row| {
                        let flat = is_flat([exact_up.row(row), exact_down.row(row)], fillings);
                        if flat {
                            let step = self.steps[row];
                            debug!(bundle = %self.name, step, "flat reference, no scaling");
                        }
                        !flat
                    })
                    .collect();
                let mut samples = Vec::with_capacity(measurements.len());
                for m in &measurements {
                    let mut values = Array1::<f64>::zeros(rows.len());
                    for (i, &row) in rows.iter().enumerate() {
                        values[i] = scaling_factor(
                            self.steps[row],
                            [m.up.row(row), m.down.row(row)],
                            [exact_up.row(row), exact_down.row(row)],
                            fillings,
                        )?;
                    }
                    samples.push(column(values));
                }
                scaled_rows = Some(rows);
                vec![series("value", &samples, None)]
            }
            Some((basis, observable)) => {
                let (exact_up, exact_down) = self.exact()?;
                let factors = self.rescaling_factors()?;
                let (nu_up, nu_down) = self.fillings();

                let names = quantity.series_names();
                let mut first = Vec::with_capacity(measurements.len());
                let mut second = Vec::with_capacity(measurements.len());
                for m in &measurements {
                    let up = rescale(&m.up, nu_up, &factors);
                    let down = rescale(&m.down, nu_down, &factors);
                    let (a, b) = change_basis(basis, up, down);
                    first.push(observe(observable, &a, &times));
                    second.push(observe(observable, &b, &times));
                }
                let (exact_a, exact_b) = change_basis(basis, exact_up, exact_down);
                vec![
                    series(names[0], &first, Some(observe(observable, &exact_a, &times))),
                    series(names[1], &second, Some(observe(observable, &exact_b, &times))),
                ]
            }
        };

        let (steps, times) = match scaled_rows {
            Some(rows) => (
                rows.iter().map(|&row| self.steps[row]).collect(),
                rows.iter().map(|&row| times[row]).collect(),
            ),
            None => (self.steps.clone(), times),
        };
        Ok(QuantityData {
            quantity,
            steps,
            times,
            instances: measurements.len(),
            series,
        })
    }

    /// Mean filling `N_σ / L` of both chains.
    fn fillings(&self) -> (f64, f64) {
        let sites = self.parameters.sites_count() as f64;
        (
            self.parameters.particles_up() as f64 / sites,
            self.parameters.particles_down() as f64 / sites,
        )
    }

    fn row_of(&self, step: usize) -> AnalysisResult<usize> {
        self.steps
            .binary_search(&step)
            .map_err(|_| AnalysisError::UnknownStep {
                step,
                experiment: self.name.clone(),
            })
    }

    /// Reference densities at the bundle's steps.
    fn exact(&self) -> AnalysisResult<(Array2<f64>, Array2<f64>)> {
        let trajectory = self
            .numerics
            .as_ref()
            .ok_or_else(|| AnalysisError::NumericsNotCached(self.name.clone()))?;
        let sites = self.parameters.sites_count();
        let mut up = Array2::<f64>::zeros((self.steps.len(), sites));
        let mut down = Array2::<f64>::zeros((self.steps.len(), sites));
        for (row, &step) in self.steps.iter().enumerate() {
            let (u, d) = trajectory
                .densities_at(step)
                .ok_or_else(|| AnalysisError::UnknownStep {
                    step,
                    experiment: self.name.clone(),
                })?;
            up.row_mut(row).assign(&u);
            down.row_mut(row).assign(&d);
        }
        Ok((up, down))
    }

    /// Effective rescaling evaluated at every step.
    fn rescaling_factors(&self) -> AnalysisResult<Vec<f64>> {
        let rescaling = self.effective_rescaling()?;
        self.steps
            .iter()
            .map(|&step| {
                let factor = rescaling.at(step);
                if factor.is_finite() && factor > SCALING_EPSILON {
                    Ok(factor)
                } else {
                    Err(AnalysisError::DegenerateRescaling(format!(
                        "factor {factor} at step {step} of '{}'",
                        self.name
                    )))
                }
            })
            .collect()
    }

    fn measurements(&self) -> AnalysisResult<Vec<Measurement>> {
        let sites = self.parameters.sites_count();
        let particles = (self.parameters.particles_up(), self.parameters.particles_down());
        self.experiments()
            .map(|experiment| -> AnalysisResult<Measurement> {
                let mut m = Measurement {
                    post_selection: Array1::zeros(self.steps.len()),
                    up: Array2::zeros((self.steps.len(), sites)),
                    down: Array2::zeros((self.steps.len(), sites)),
                };
                for (row, &step) in self.steps.iter().enumerate() {
                    let run = experiment
                        .run(step)
                        .ok_or_else(|| AnalysisError::UnknownStep {
                            step,
                            experiment: experiment.name.clone(),
                        })?;
                    let (rate, up, down) = post_select(run, sites, particles).ok_or_else(|| {
                        AnalysisError::NoPostSelectedShots {
                            experiment: experiment.name.clone(),
                            step,
                        }
                    })?;
                    m.post_selection[row] = rate;
                    m.up.row_mut(row).assign(&up);
                    m.down.row_mut(row).assign(&down);
                }
                Ok(m)
            })
            .collect()
    }
}

/// Keep the shots with the prepared particle numbers and average their
/// occupations. Returns `None` when no shot survives.
fn post_select(
    run: &TrotterRun,
    sites: usize,
    (n_up, n_down): (usize, usize),
) -> Option<(f64, Array1<f64>, Array1<f64>)> {
    let mut up = Array1::<f64>::zeros(sites);
    let mut down = Array1::<f64>::zeros(sites);
    let mut kept = 0u64;
    for (bits, count) in run.counts.iter() {
        let bits = bits.as_bytes();
        let (up_bits, down_bits) = bits.split_at(sites);
        let ones = |half: &[u8]| half.iter().filter(|&&b| b == b'1').count();
        if ones(up_bits) != n_up || ones(down_bits) != n_down {
            continue;
        }
        kept += count;
        for site in 0..sites {
            if up_bits[site] == b'1' {
                up[site] += count as f64;
            }
            if down_bits[site] == b'1' {
                down[site] += count as f64;
            }
        }
    }
    if kept == 0 {
        return None;
    }
    let kept_f = kept as f64;
    let rate = kept_f / run.counts.total_shots() as f64;
    Some((rate, up / kept_f, down / kept_f))
}

/// Least-squares slope of measured against exact deviations from the
/// filling, over both chains.
fn scaling_factor(
    step: usize,
    measured: [ArrayView1<'_, f64>; 2],
    exact: [ArrayView1<'_, f64>; 2],
    fillings: [f64; 2],
) -> AnalysisResult<f64> {
    if is_flat(exact, fillings) {
        return Err(AnalysisError::DegenerateScaling { step });
    }
    let mut numerator = 0.0;
    for chain in 0..2 {
        let nu = fillings[chain];
        for (n, e) in measured[chain].iter().zip(exact[chain].iter()) {
            numerator += (n - nu) * (e - nu);
        }
    }
    Ok(numerator / reference_norm(exact, fillings))
}

/// `Σ(e - ν)²` over both chains.
fn reference_norm(exact: [ArrayView1<'_, f64>; 2], fillings: [f64; 2]) -> f64 {
    exact
        .iter()
        .zip(fillings)
        .map(|(chain, nu)| chain.iter().map(|e| (e - nu) * (e - nu)).sum::<f64>())
        .sum()
}

/// A reference that does not deviate from the filling cannot be scaled.
fn is_flat(exact: [ArrayView1<'_, f64>; 2], fillings: [f64; 2]) -> bool {
    reference_norm(exact, fillings) < SCALING_EPSILON
}

/// `ν + (n - ν) / s(k)` row by row.
fn rescale(density: &Array2<f64>, filling: f64, factors: &[f64]) -> Array2<f64> {
    let mut out = density.clone();
    for (mut row, &factor) in out.rows_mut().into_iter().zip(factors) {
        row.mapv_inplace(|n| filling + (n - filling) / factor);
    }
    out
}

fn change_basis(basis: Basis, up: Array2<f64>, down: Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    match basis {
        Basis::UpDown => (up, down),
        Basis::ChargeSpin => (&up + &down, &up - &down),
    }
}

fn observe(observable: Observable, density: &Array2<f64>, times: &[f64]) -> Array2<f64> {
    match observable {
        Observable::Density => density.clone(),
        Observable::PositionAverage => stats::position_average(density),
        Observable::PositionAverageDt => {
            stats::time_derivative(&stats::position_average(density), times)
        }
        Observable::Spreading => stats::spreading(density),
        Observable::SpreadingDt => stats::time_derivative(&stats::spreading(density), times),
    }
}

fn series(name: &str, samples: &[Array2<f64>], exact: Option<Array2<f64>>) -> Series {
    let (mean, std, stderr) = stats::aggregate(samples);
    Series {
        name: name.to_string(),
        mean,
        std,
        stderr,
        exact,
    }
}

fn column(values: Array1<f64>) -> Array2<f64> {
    values.insert_axis(ndarray::Axis(1))
}

fn sorted_unique(mut steps: Vec<usize>) -> Vec<usize> {
    steps.sort_unstable();
    steps.dedup();
    steps
}

fn common_steps(experiments: &[ExperimentResult]) -> Vec<usize> {
    let mut common: Option<BTreeSet<usize>> = None;
    for experiment in experiments {
        let steps: BTreeSet<usize> = experiment.steps().into_iter().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&steps).copied().collect(),
            None => steps,
        });
    }
    common.unwrap_or_default().into_iter().collect()
}
