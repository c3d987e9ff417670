//! Synthetic noisy measurement data.
//!
//! Produces [`ExperimentResult`]s with the same shape as hardware data so
//! that the analysis pipeline can be exercised without a device. Noise is a
//! global depolarising channel that grows with circuit depth plus
//! independent readout bit flips.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use spinsep_data::{Counts, ExperimentResult, FermiHubbardParameters, TrotterRun};

use crate::error::{SimError, SimResult};
use crate::numerics::{initial_state, trotter_evolution};
use crate::statevector::outcome_to_bitstring;

/// Noise and shot settings for synthetic data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Shots per Trotter step.
    pub shots: u64,
    /// Depolarising probability per Trotter step.
    pub depolarization: f64,
    /// Probability of flipping each measured bit.
    pub readout_error: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            shots: 1000,
            depolarization: 0.02,
            readout_error: 0.01,
            seed: 0,
        }
    }
}

impl SamplingConfig {
    fn validate(&self) -> SimResult<()> {
        if self.shots == 0 {
            return Err(SimError::InvalidSampling("shots must be at least 1".into()));
        }
        for (name, p) in [
            ("depolarization", self.depolarization),
            ("readout_error", self.readout_error),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidSampling(format!(
                    "{name} must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }

    /// Probability that a shot after `step` Trotter steps is fully depolarised.
    pub fn depolarized_fraction(&self, step: usize) -> f64 {
        1.0 - (1.0 - self.depolarization).powi(step as i32)
    }
}

/// Sample a synthetic experiment for `params` at the given Trotter steps.
pub fn sample_experiment(
    name: impl Into<String>,
    params: &FermiHubbardParameters,
    steps: &[usize],
    config: &SamplingConfig,
) -> SimResult<ExperimentResult> {
    params.validate()?;
    config.validate()?;

    let mut steps = steps.to_vec();
    steps.sort_unstable();
    steps.dedup();

    let num_qubits = params.qubits_count();
    let dim = 1usize << num_qubits;
    let evolution = trotter_evolution(params)?;
    let mut state = initial_state(params)?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut runs = Vec::with_capacity(steps.len());
    let mut current = 0;
    for &step in &steps {
        evolution.evolve(&mut state, step - current);
        current = step;

        let ideal = WeightedIndex::new(state.probabilities())
            .map_err(|e| SimError::Numerics(format!("cannot sample state: {e}")))?;
        let depolarized = config.depolarized_fraction(step);

        let mut counts = Counts::new();
        for _ in 0..config.shots {
            let mut outcome = if rng.gen_bool(depolarized) {
                rng.gen_range(0..dim)
            } else {
                ideal.sample(&mut rng)
            };
            if config.readout_error > 0.0 {
                for q in 0..num_qubits {
                    if rng.gen_bool(config.readout_error) {
                        outcome ^= 1 << q;
                    }
                }
            }
            counts.add(outcome_to_bitstring(outcome, num_qubits), 1);
        }
        debug!(step, distinct = counts.len(), "sampled synthetic step");
        runs.push(TrotterRun::new(step, counts));
    }

    let mut result = ExperimentResult::new(name, params.clone(), runs);
    result.processor = Some("statevector-simulator".into());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinsep_data::{ChainInitialState, Hamiltonian, IndependentChainsInitialState, Layout};

    fn params() -> FermiHubbardParameters {
        FermiHubbardParameters::new(
            Hamiltonian::new(3, 1.0, 2.0),
            IndependentChainsInitialState::new(
                ChainInitialState::FixedSingleParticle { site: 0 },
                ChainInitialState::FixedSingleParticle { site: 2 },
            ),
            Layout::line(3, [0, 0]),
            0.3,
        )
    }

    #[test]
    fn test_noiseless_sampling_conserves_particles() {
        let config = SamplingConfig {
            shots: 200,
            depolarization: 0.0,
            readout_error: 0.0,
            seed: 3,
        };
        let result = sample_experiment("clean", &params(), &[0, 2, 5], &config).unwrap();
        assert_eq!(result.steps(), vec![0, 2, 5]);
        for run in &result.runs {
            assert_eq!(run.counts.total_shots(), 200);
            for (bits, _) in run.counts.iter() {
                assert_eq!(bits[..3].matches('1').count(), 1);
                assert_eq!(bits[3..].matches('1').count(), 1);
            }
        }
        // Step 0 is the prepared product state.
        assert_eq!(result.runs[0].counts.get("100001"), 200);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_same_seed_same_data() {
        let config = SamplingConfig::default();
        let a = sample_experiment("a", &params(), &[1, 4], &config).unwrap();
        let b = sample_experiment("a", &params(), &[1, 4], &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_noise_rejected() {
        let config = SamplingConfig {
            depolarization: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            sample_experiment("bad", &params(), &[0], &config),
            Err(SimError::InvalidSampling(_))
        ));
    }

    #[test]
    fn test_depolarized_fraction_grows_with_depth() {
        let config = SamplingConfig {
            depolarization: 0.1,
            ..Default::default()
        };
        assert_eq!(config.depolarized_fraction(0), 0.0);
        assert!(config.depolarized_fraction(5) > config.depolarized_fraction(1));
    }
}
