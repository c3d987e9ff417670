//! Exact-numerics reference trajectories.
//!
//! The reference is the noiseless Trotter evolution of the prepared initial
//! state, recorded as site densities of both chains at each requested step.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use spinsep_data::FermiHubbardParameters;

use crate::error::SimResult;
use crate::hamiltonian::HubbardModel;
use crate::orbitals::chain_orbitals;
use crate::statevector::Statevector;
use crate::trotter::TrotterEvolution;

/// Progress of a reference computation, reported after every recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Steps recorded so far.
    pub completed: usize,
    /// Steps to record in total.
    pub total: usize,
    /// Trotter step count just recorded.
    pub trotter_steps: usize,
}

/// Site densities of both chains at each recorded Trotter step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Recorded step counts, ascending.
    pub steps: Vec<usize>,
    /// Time per step.
    pub dt: f64,
    /// Spin-up densities, shape `(steps, sites)`.
    pub up: Array2<f64>,
    /// Spin-down densities, shape `(steps, sites)`.
    pub down: Array2<f64>,
}

impl Trajectory {
    /// Evolution time of every recorded step.
    pub fn times(&self) -> Vec<f64> {
        self.steps.iter().map(|&s| s as f64 * self.dt).collect()
    }

    /// Number of sites per chain.
    pub fn sites_count(&self) -> usize {
        self.up.ncols()
    }

    /// Row index of a recorded step.
    pub fn index_of(&self, step: usize) -> Option<usize> {
        self.steps.binary_search(&step).ok()
    }

    /// Up and down densities at a recorded step.
    pub fn densities_at(&self, step: usize) -> Option<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        self.index_of(step)
            .map(|row| (self.up.row(row), self.down.row(row)))
    }
}

/// Prepare the initial state of a problem instance.
pub fn initial_state(params: &FermiHubbardParameters) -> SimResult<Statevector> {
    let sites = params.sites_count();
    let up = chain_orbitals(&params.initial_state.up, sites)?;
    let down = chain_orbitals(&params.initial_state.down, sites)?;
    Statevector::from_chains(&up, &down, sites)
}

/// Build the Trotter step operator of a problem instance.
pub fn trotter_evolution(params: &FermiHubbardParameters) -> SimResult<TrotterEvolution> {
    let model = HubbardModel::from_hamiltonian(&params.hamiltonian);
    let evolution = TrotterEvolution::new(model, params.dt)?;
    Ok(match params.parasitic_cphase {
        Some(cphase) => evolution.with_parasitic_cphase(cphase),
        None => evolution,
    })
}

/// Compute the reference trajectory at `steps` (sorted and deduplicated).
///
/// Evolution is incremental: the state is carried from one recorded step to
/// the next. `progress` is called once per recorded step; any failure aborts
/// the whole computation.
pub fn compute_trajectory(
    params: &FermiHubbardParameters,
    steps: &[usize],
    mut progress: Option<&mut dyn FnMut(Progress)>,
) -> SimResult<Trajectory> {
    params.validate()?;
    let mut steps = steps.to_vec();
    steps.sort_unstable();
    steps.dedup();

    let sites = params.sites_count();
    let evolution = trotter_evolution(params)?;
    let mut state = initial_state(params)?;

    info!(
        sites,
        steps = steps.len(),
        max_step = steps.last().copied().unwrap_or(0),
        "computing exact numerics"
    );

    let mut up = Array2::<f64>::zeros((steps.len(), sites));
    let mut down = Array2::<f64>::zeros((steps.len(), sites));
    let mut current = 0;
    for (row, &step) in steps.iter().enumerate() {
        evolution.evolve(&mut state, step - current);
        current = step;

        let occupations = state.occupations();
        for site in 0..sites {
            up[(row, site)] = occupations[site];
            down[(row, site)] = occupations[sites + site];
        }
        debug!(step, norm = state.norm_sqr(), "recorded reference step");

        if let Some(callback) = progress.as_deref_mut() {
            callback(Progress {
                completed: row + 1,
                total: steps.len(),
                trotter_steps: step,
            });
        }
    }

    Ok(Trajectory {
        steps,
        dt: params.dt,
        up,
        down,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinsep_data::{ChainInitialState, Hamiltonian, IndependentChainsInitialState, Layout};

    fn pair_params(j: f64, dt: f64) -> FermiHubbardParameters {
        FermiHubbardParameters::new(
            Hamiltonian::new(2, j, 0.0),
            IndependentChainsInitialState::new(
                ChainInitialState::FixedSingleParticle { site: 0 },
                ChainInitialState::FixedSingleParticle { site: 1 },
            ),
            Layout::line(2, [0, 0]),
            dt,
        )
    }

    #[test]
    fn test_two_site_oscillation() {
        let params = pair_params(1.0, 0.1);
        let trajectory = compute_trajectory(&params, &[0, 3, 7, 12], None).unwrap();
        for (row, &step) in trajectory.steps.iter().enumerate() {
            let t = step as f64 * 0.1;
            assert!((trajectory.up[(row, 0)] - t.cos().powi(2)).abs() < 1e-10);
            assert!((trajectory.down[(row, 1)] - t.cos().powi(2)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_steps_sorted_and_deduplicated() {
        let params = pair_params(1.0, 0.1);
        let trajectory = compute_trajectory(&params, &[4, 0, 4, 2], None).unwrap();
        assert_eq!(trajectory.steps, vec![0, 2, 4]);
        assert!(trajectory.index_of(2).is_some());
        assert!(trajectory.densities_at(3).is_none());
        assert_eq!(trajectory.times().len(), 3);
    }

    #[test]
    fn test_progress_called_per_step() {
        let params = pair_params(1.0, 0.1);
        let mut seen = Vec::new();
        let mut record = |p: Progress| seen.push((p.completed, p.total, p.trotter_steps));
        compute_trajectory(&params, &[0, 1, 5], Some(&mut record)).unwrap();
        assert_eq!(seen, vec![(1, 3, 0), (2, 3, 1), (3, 3, 5)]);
    }

    #[test]
    fn test_invalid_parameters_abort() {
        let mut params = pair_params(1.0, 0.1);
        params.dt = -1.0;
        assert!(compute_trajectory(&params, &[0], None).is_err());
    }
}
