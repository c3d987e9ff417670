//! Integration tests for shared rescaling and the end-to-end analyzer.

use spinsep_analysis::export::{self, ExportConfig};
use spinsep_analysis::{
    AnalysisConfig, AnalysisError, AnalysisProgress, Analyzer, ConstantFit, InstanceBundle,
    LinearFit, NumericsCache, Quantity, RescalingStrategy, StrategyKind,
    apply_rescalings_to_bundles, find_bundles_rescalings,
};
use spinsep_data::{
    ChainInitialState, ExperimentResult, FermiHubbardParameters, Hamiltonian,
    IndependentChainsInitialState, Layout, load_dataset, save_group,
};
use spinsep_sim::{Progress, SamplingConfig, sample_experiment};

const STEPS: [usize; 5] = [0, 2, 4, 6, 8];

fn params(u: f64) -> FermiHubbardParameters {
    let trap = ChainInitialState::GaussianTrappingPotential {
        particles: 1,
        center: 0.5,
        sigma: 1.0 / 7.0,
        scale: -4.0,
    };
    FermiHubbardParameters::new(
        Hamiltonian::new(4, 1.0, u),
        IndependentChainsInitialState::new(trap.clone(), trap),
        Layout::line(4, [0, 0]),
        0.3,
    )
}

fn sampled(u: f64, layouts: i32) -> Vec<ExperimentResult> {
    (0..layouts)
        .map(|i| {
            let config = SamplingConfig {
                shots: 4000,
                depolarization: 0.05,
                readout_error: 0.01,
                seed: 100 + i as u64,
            };
            let p = params(u).with_layout(Layout::zigzag(4, [i, 1]));
            sample_experiment(format!("zigzag-{i}"), &p, &STEPS, &config).unwrap()
        })
        .collect()
}

fn cached_bundles(cache: &mut NumericsCache) -> Vec<InstanceBundle> {
    [0.0, 4.0]
        .into_iter()
        .map(|u| {
            let mut bundle = InstanceBundle::builder(sampled(u, 2))
                .with_name(format!("u={u}"))
                .build()
                .unwrap();
            bundle.cache_exact_numerics(cache, None).unwrap();
            bundle
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Shared rescaling
// ---------------------------------------------------------------------------

#[test]
fn applied_rescaling_is_shared_by_every_bundle() {
    let mut cache = NumericsCache::new();
    let mut bundles = cached_bundles(&mut cache);
    let rescaling = find_bundles_rescalings(&bundles, &LinearFit).unwrap();
    apply_rescalings_to_bundles(&rescaling, &mut bundles);

    for bundle in &bundles {
        assert_eq!(bundle.rescaling(), Some(&rescaling));
        assert_eq!(bundle.effective_rescaling().unwrap(), rescaling);
    }
}

#[test]
fn clearing_restores_own_fit() {
    let mut cache = NumericsCache::new();
    let mut bundles = cached_bundles(&mut cache);
    let own = bundles[0].effective_rescaling().unwrap();
    let shared = find_bundles_rescalings(&bundles, &ConstantFit).unwrap();
    assert_eq!(shared.slope, 0.0);

    apply_rescalings_to_bundles(&shared, &mut bundles);
    bundles[0].clear_rescaling();
    assert_eq!(bundles[0].rescaling(), None);
    assert_eq!(bundles[0].effective_rescaling().unwrap(), own);
    assert_eq!(bundles[1].rescaling(), Some(&shared));
}

#[test]
fn resolver_needs_cached_numerics() {
    let bundles = vec![InstanceBundle::new(sampled(0.0, 1)).unwrap()];
    assert!(matches!(
        find_bundles_rescalings(&bundles, &LinearFit),
        Err(AnalysisError::NumericsNotCached(_))
    ));
}

#[test]
fn joint_fit_pools_points_of_all_bundles() {
    let mut cache = NumericsCache::new();
    let bundles = cached_bundles(&mut cache);
    let mut points = bundles[0].scaling_points().unwrap();
    points.extend(bundles[1].scaling_points().unwrap());
    let expected = ConstantFit.fit(&points).unwrap();
    assert_eq!(
        find_bundles_rescalings(&bundles, &ConstantFit).unwrap(),
        expected
    );
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[test]
fn analyzer_runs_over_a_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    save_group(dir.path(), "0.0", &sampled(0.0, 2)).unwrap();
    save_group(dir.path(), "4.0", &sampled(4.0, 2)).unwrap();
    let dataset = load_dataset(dir.path()).unwrap();

    let config = AnalysisConfig {
        rescale_steps: Some(vec![2, 4, 6]),
        quantities: vec![Quantity::PostSelection, Quantity::ChargeSpinSpreading],
        ..Default::default()
    };
    let analyzer = Analyzer::new(config);
    let mut cache = NumericsCache::new();
    let args = vec!["spinsep".to_string(), "analyze".to_string()];
    let (bundles, report) = analyzer.analyze(dataset, &mut cache, &args, None).unwrap();

    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0].name(), "u=0.0");
    assert_eq!(bundles[0].rescale_steps(), &[2, 4, 6]);
    assert_eq!(report.bundles.len(), 2);
    assert_eq!(report.reproducibility.reference_simulations, 2);
    assert!(report.bundles.iter().all(|b| b.numerics_transform.is_none()));

    let shared = report.shared_rescaling.unwrap();
    for bundle in &report.bundles {
        assert_eq!(bundle.rescaling, shared);
        assert_eq!(bundle.instances, 2);
        assert_eq!(bundle.quantities.len(), 2);
        assert!(bundle.quantity(Quantity::ChargeSpinSpreading).is_some());
    }

    let path = dir.path().join("report.json");
    export::to_file(&report, &path, &ExportConfig::default()).unwrap();
    let restored = export::from_file(&path).unwrap();
    assert_eq!(restored.bundles.len(), 2);
    assert_eq!(restored.config, report.config);
    assert_eq!(restored.bundles[1].steps, STEPS.to_vec());
}

#[derive(Default)]
struct Recorder {
    started: Vec<String>,
    steps: usize,
    finished: usize,
}

impl AnalysisProgress for Recorder {
    fn bundle_started(&mut self, bundle: &InstanceBundle) {
        self.started.push(bundle.name().to_string());
    }

    fn step_completed(&mut self, _progress: Progress) {
        self.steps += 1;
    }

    fn bundle_finished(&mut self, _bundle: &InstanceBundle) {
        self.finished += 1;
    }
}

#[test]
fn analyzer_reports_reference_progress() {
    let dir = tempfile::tempdir().unwrap();
    save_group(dir.path(), "0.0", &sampled(0.0, 1)).unwrap();
    save_group(dir.path(), "4.0", &sampled(4.0, 1)).unwrap();
    let analyzer = Analyzer::new(AnalysisConfig {
        quantities: vec![Quantity::PostSelection],
        ..Default::default()
    });
    let mut cache = NumericsCache::new();

    let mut recorder = Recorder::default();
    analyzer
        .analyze(load_dataset(dir.path()).unwrap(), &mut cache, &[], Some(&mut recorder))
        .unwrap();
    assert_eq!(recorder.started, vec!["u=0.0", "u=4.0"]);
    assert_eq!(recorder.steps, 2 * STEPS.len());
    assert_eq!(recorder.finished, 2);

    // A warm cache runs no simulation.
    let mut again = Recorder::default();
    let (_, report) = analyzer
        .analyze(load_dataset(dir.path()).unwrap(), &mut cache, &[], Some(&mut again))
        .unwrap();
    assert_eq!(again.started.len(), 2);
    assert_eq!(again.steps, 0);
    assert_eq!(report.reproducibility.reference_simulations, 0);
}

#[test]
fn analyzer_without_sharing_keeps_own_fits() {
    let dir = tempfile::tempdir().unwrap();
    save_group(dir.path(), "2.0", &sampled(2.0, 1)).unwrap();
    let config = AnalysisConfig {
        shared_rescaling: false,
        strategy: StrategyKind::Constant,
        quantities: vec![Quantity::Scaling],
        parasitic_cphase: Some(0.138),
        ..Default::default()
    };
    let mut cache = NumericsCache::new();
    let (bundles, report) = Analyzer::new(config)
        .analyze(load_dataset(dir.path()).unwrap(), &mut cache, &[], None)
        .unwrap();
    assert!(report.shared_rescaling.is_none());
    assert!(bundles[0].rescaling().is_none());
    // Own fit follows the configured strategy.
    assert_eq!(bundles[0].effective_rescaling().unwrap().slope, 0.0);
    assert_eq!(report.bundles[0].rescaling.slope, 0.0);
    assert_eq!(
        report.bundles[0].numerics_transform.as_deref(),
        Some("parasitic_cphase(0.138)")
    );
}

#[test]
fn default_analysis_survives_flat_reference_steps() {
    let uniform = FermiHubbardParameters::new(
        Hamiltonian::new(4, 1.0, 0.0),
        IndependentChainsInitialState::new(
            ChainInitialState::UniformSingleParticle,
            ChainInitialState::UniformSingleParticle,
        ),
        Layout::line(4, [0, 0]),
        0.3,
    );
    let experiments: Vec<_> = (0..2)
        .map(|i| {
            let config = SamplingConfig {
                shots: 20_000,
                depolarization: 0.0,
                readout_error: 0.0,
                seed: 7 + i as u64,
            };
            let p = uniform.clone().with_layout(Layout::line(4, [i, 0]));
            sample_experiment(format!("uniform-{i}"), &p, &[0, 1, 2, 3], &config).unwrap()
        })
        .collect();
    let dir = tempfile::tempdir().unwrap();
    save_group(dir.path(), "0.0", &experiments).unwrap();

    let mut cache = NumericsCache::new();
    let (bundles, report) = Analyzer::new(AnalysisConfig::default())
        .analyze(load_dataset(dir.path()).unwrap(), &mut cache, &[], None)
        .unwrap();
    assert_eq!(report.bundles[0].quantities.len(), Quantity::ALL.len());

    let scaled_steps: Vec<_> = bundles[0]
        .scaling_points()
        .unwrap()
        .into_iter()
        .map(|(step, _)| step)
        .collect();
    assert!(!scaled_steps.contains(&0));
    let scaling = report.bundles[0].quantity(Quantity::Scaling).unwrap();
    assert_eq!(scaling.steps, scaled_steps);
}
