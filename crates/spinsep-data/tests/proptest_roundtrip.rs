//! Property-based tests for experiment record persistence.
//!
//! Any valid record must survive JSON serialisation unchanged.

use proptest::prelude::*;
use spinsep_data::{
    ChainInitialState, Counts, ExperimentResult, FermiHubbardParameters, Hamiltonian,
    IndependentChainsInitialState, Layout, TrotterRun,
};

fn arb_chain(sites: usize) -> impl Strategy<Value = ChainInitialState> {
    prop_oneof![
        (1..=sites, 0.0..1.0f64, 0.05..0.5f64, -8.0..0.0f64).prop_map(
            |(particles, center, sigma, scale)| ChainInitialState::GaussianTrappingPotential {
                particles,
                center,
                sigma,
                scale,
            }
        ),
        (0..sites).prop_map(|site| ChainInitialState::FixedSingleParticle { site }),
        Just(ChainInitialState::UniformSingleParticle),
        (-3.0..3.0f64, 0.05..0.5f64, 0.0..1.0f64).prop_map(|(k, sigma, position)| {
            ChainInitialState::PhasedGaussianSingleParticle { k, sigma, position }
        }),
    ]
}

fn arb_counts(width: usize) -> impl Strategy<Value = Counts> {
    prop::collection::vec(
        (prop::collection::vec(any::<bool>(), width), 1..500u64),
        0..8,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(bits, count)| {
                let bitstring: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
                (bitstring, count)
            })
            .collect()
    })
}

/// Records with 2-5 sites, arbitrary couplings and up to 4 Trotter runs.
fn arb_experiment() -> impl Strategy<Value = ExperimentResult> {
    (2usize..=5).prop_flat_map(|sites| {
        (
            -2.0..2.0f64,
            prop::collection::vec(-8.0..8.0f64, sites),
            arb_chain(sites),
            arb_chain(sites),
            0.01..1.0f64,
            proptest::option::of(-0.5..0.5f64),
            prop::collection::vec(arb_counts(2 * sites), 0..4),
        )
            .prop_map(move |(j, u, up, down, dt, cphase, counts)| {
                let mut params = FermiHubbardParameters::new(
                    Hamiltonian::new(sites, j, u),
                    IndependentChainsInitialState::new(up, down),
                    Layout::zigzag(sites, [1, 2]),
                    dt,
                );
                params.parasitic_cphase = cphase;
                let runs = counts
                    .into_iter()
                    .enumerate()
                    .map(|(step, counts)| TrotterRun::new(step, counts))
                    .collect();
                ExperimentResult::new(format!("prop-{sites}"), params, runs)
            })
    })
}

proptest! {
    #[test]
    fn json_roundtrip_preserves_record(result in arb_experiment()) {
        let json = result.to_json().unwrap();
        let back = ExperimentResult::from_json(&json).unwrap();
        prop_assert_eq!(&back, &result);
        prop_assert_eq!(back.to_json().unwrap(), json);
        prop_assert!(back.parameters.physics_equivalent(&result.parameters));
        prop_assert_eq!(
            back.parameters.fingerprint().unwrap(),
            result.parameters.fingerprint().unwrap()
        );
    }

    #[test]
    fn json_roundtrip_preserves_every_time_step(dt in 0.01..1.01f64) {
        let chain = ChainInitialState::UniformSingleParticle;
        let params = FermiHubbardParameters::new(
            Hamiltonian::new(2, 1.0, 0.0),
            IndependentChainsInitialState::new(chain.clone(), chain),
            Layout::line(2, [0, 0]),
            dt,
        );
        let result = ExperimentResult::new("dt", params, Vec::new());
        let back = ExperimentResult::from_json(&result.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.parameters.dt.to_bits(), dt.to_bits());
    }
}
