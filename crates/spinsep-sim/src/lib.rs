//! `spinsep-sim` — exact-numerics reference simulation of Fermi-Hubbard chains.
//!
//! Prepares the initial Slater-determinant state of both spin chains and
//! evolves it with the same first-order Trotter product formula the
//! experiment implements, without noise:
//!
//! - **Orbitals**: trapped, localised, uniform or phased-Gaussian chains
//! - **Trotter evolution**: even/odd hopping layers plus diagonal phases
//! - **Trajectories**: site densities at every requested step
//! - **Sampling**: synthetic noisy shot data in the experiment format
//!
//! # Quick start
//!
//! ```rust
//! use spinsep_data::{
//!     ChainInitialState, FermiHubbardParameters, Hamiltonian, IndependentChainsInitialState,
//!     Layout,
//! };
//! use spinsep_sim::compute_trajectory;
//!
//! let params = FermiHubbardParameters::new(
//!     Hamiltonian::new(4, 1.0, 2.0),
//!     IndependentChainsInitialState::new(
//!         ChainInitialState::FixedSingleParticle { site: 1 },
//!         ChainInitialState::FixedSingleParticle { site: 2 },
//!     ),
//!     Layout::line(4, [0, 0]),
//!     0.3,
//! );
//! let trajectory = compute_trajectory(&params, &[0, 1, 2, 3], None).unwrap();
//! assert_eq!(trajectory.up.shape(), &[4, 4]);
//! ```

pub mod error;
pub mod hamiltonian;
pub mod numerics;
pub mod orbitals;
pub mod sampling;
pub mod statevector;
pub mod trotter;

pub use error::{SimError, SimResult};
pub use hamiltonian::{HubbardModel, HubbardTerm, Spin};
pub use numerics::{Progress, Trajectory, compute_trajectory};
pub use sampling::{SamplingConfig, sample_experiment};
pub use statevector::{MAX_QUBITS, Statevector};
pub use trotter::TrotterEvolution;
