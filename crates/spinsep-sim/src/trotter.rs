//! First-order Trotter evolution of the Fermi-Hubbard chain.
//!
//! One Trotter step of length `dt` applies
//!
//!   exp(-i H_diag dt) · exp(-i H_odd dt) · exp(-i H_even dt)
//!
//! where `H_even`/`H_odd` are the hopping terms on even/odd bonds (each a
//! product of commuting two-qubit rotations) and `H_diag` collects all
//! occupation-diagonal terms, applied as one precomputed phase per basis
//! state. Error per step: O(dt²).

use num_complex::Complex64;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::hamiltonian::HubbardModel;
use crate::statevector::{MAX_QUBITS, Statevector};

/// Trotterised time-evolution operator for one problem instance.
pub struct TrotterEvolution {
    model: HubbardModel,
    /// Time step per Trotter slice.
    dt: f64,
    /// Parasitic controlled phase after every hopping gate.
    cphase: f64,
    /// `exp(-i E_diag dt)` per basis state.
    diagonal_phases: Vec<Complex64>,
}

impl TrotterEvolution {
    /// Construct a Trotter step operator.
    ///
    /// # Arguments
    /// * `model`: term decomposition of the Hamiltonian
    /// * `dt`: time per Trotter step
    pub fn new(model: HubbardModel, dt: f64) -> SimResult<Self> {
        let num_qubits = model.qubits_count();
        if num_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits {
                qubits: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let diagonal_phases = (0..1usize << num_qubits)
            .map(|basis| Complex64::from_polar(1.0, -model.diagonal_energy(basis) * dt))
            .collect();
        debug!(
            n_terms = model.n_terms(),
            num_qubits, dt, "prepared Trotter step operator"
        );
        Ok(Self {
            model,
            dt,
            cphase: 0.0,
            diagonal_phases,
        })
    }

    /// Apply a parasitic controlled phase `φ` to doubly occupied pairs after
    /// every hopping gate.
    #[must_use]
    pub fn with_parasitic_cphase(mut self, cphase: f64) -> Self {
        self.cphase = cphase;
        self
    }

    /// The underlying model.
    pub fn model(&self) -> &HubbardModel {
        &self.model
    }

    /// Time per step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Apply one Trotter step.
    pub fn step(&self, state: &mut Statevector) {
        for parity in [0, 1] {
            for (q1, q2, j) in self.model.hopping_layer(parity) {
                state.apply_hopping(q1, q2, j * self.dt, self.cphase);
            }
        }
        state.apply_diagonal(&self.diagonal_phases);
    }

    /// Apply `n_steps` Trotter steps.
    pub fn evolve(&self, state: &mut Statevector, n_steps: usize) {
        for _ in 0..n_steps {
            self.step(state);
        }
    }
}
