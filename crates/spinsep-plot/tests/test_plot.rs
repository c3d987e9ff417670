//! Rendering tests over sampled bundles.

use spinsep_analysis::{InstanceBundle, NumericsCache, Quantity};
use spinsep_data::{
    ChainInitialState, FermiHubbardParameters, Hamiltonian, IndependentChainsInitialState, Layout,
};
use spinsep_plot::{ErrorBand, PlotError, PlotOptions, plot_quantity};
use spinsep_sim::{SamplingConfig, sample_experiment};

const STEPS: [usize; 4] = [0, 1, 2, 3];

fn bundle(sites: usize, u: f64, cache: &mut NumericsCache) -> InstanceBundle {
    let trap = ChainInitialState::GaussianTrappingPotential {
        particles: 1,
        center: 0.5,
        sigma: 1.0 / 7.0,
        scale: -4.0,
    };
    let params = FermiHubbardParameters::new(
        Hamiltonian::new(sites, 1.0, u),
        IndependentChainsInitialState::new(trap.clone(), trap),
        Layout::line(sites, [0, 0]),
        0.3,
    );
    let experiments = (0..2)
        .map(|i| {
            let config = SamplingConfig {
                shots: 500,
                seed: i,
                ..SamplingConfig::default()
            };
            let p = params.clone().with_layout(Layout::line(sites, [i as i32, 0]));
            sample_experiment(format!("line-{i}"), &p, &STEPS, &config).unwrap()
        })
        .collect();
    let mut bundle = InstanceBundle::builder(experiments)
        .with_name(format!("L={sites} u={u}"))
        .build()
        .unwrap();
    bundle.cache_exact_numerics(cache, None).unwrap();
    bundle
}

fn read_svg(path: &std::path::Path) -> String {
    let svg = std::fs::read_to_string(path).unwrap();
    assert!(svg.contains("<svg"));
    svg
}

#[test]
fn every_quantity_renders() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = NumericsCache::new();
    let bundles = vec![bundle(4, 0.0, &mut cache), bundle(4, 4.0, &mut cache)];
    for quantity in Quantity::ALL {
        let path = dir.path().join(format!("{quantity}.svg"));
        plot_quantity(&bundles, quantity, &PlotOptions::default(), &path).unwrap();
        let svg = read_svg(&path);
        assert!(svg.contains(quantity.name()), "{quantity}: title missing");
    }
}

#[test]
fn legend_names_bundles_and_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = NumericsCache::new();
    let bundles = vec![bundle(4, 2.0, &mut cache)];

    let path = dir.path().join("spreading.svg");
    plot_quantity(
        &bundles,
        Quantity::ChargeSpinSpreading,
        &PlotOptions::default(),
        &path,
    )
    .unwrap();
    let svg = read_svg(&path);
    assert!(svg.contains("L=4 u=2"));
    assert!(svg.contains("charge"));
    assert!(svg.contains("spin"));

    let path = dir.path().join("density.svg");
    let options = PlotOptions {
        steps: Some(vec![1, 3]),
        error_band: ErrorBand::StdError,
        title: Some("Densities at U=2".into()),
        ..Default::default()
    };
    plot_quantity(&bundles, Quantity::UpDownDensity, &options, &path).unwrap();
    let svg = read_svg(&path);
    assert!(svg.contains("Densities at U=2"));
    assert!(svg.contains("k=1"));
    assert!(svg.contains("k=3"));
    assert!(!svg.contains("k=0"));
}

#[test]
fn empty_bundle_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = plot_quantity(
        &[],
        Quantity::Scaling,
        &PlotOptions::default(),
        &dir.path().join("empty.svg"),
    )
    .unwrap_err();
    assert!(matches!(err, PlotError::NoBundles));
}

#[test]
fn chains_of_different_length_cannot_share_a_profile() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = NumericsCache::new();
    let bundles = vec![bundle(3, 2.0, &mut cache), bundle(4, 2.0, &mut cache)];
    let err = plot_quantity(
        &bundles,
        Quantity::ChargeSpinDensity,
        &PlotOptions::default(),
        &dir.path().join("density.svg"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PlotError::WidthMismatch {
            expected: 3,
            found: 4,
            ..
        }
    ));

    // Trajectories have one value per step regardless of length.
    plot_quantity(
        &bundles,
        Quantity::UpDownPositionAverage,
        &PlotOptions::default(),
        &dir.path().join("position.svg"),
    )
    .unwrap();
}
