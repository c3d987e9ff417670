//! Term decomposition of the Fermi-Hubbard Hamiltonian.
//!
//! The chain Hamiltonian is split into hopping terms, which move a fermion
//! between neighbouring sites of one spin chain, and diagonal terms, which
//! only depend on occupations:
//!
//!   H = Σ hopping + Σ on-site + Σ nearest-neighbour + Σ local
//!
//! Qubit `i` holds the spin-up occupation of site `i`; qubit `L + i` the
//! spin-down occupation of site `i`. With this ordering nearest-neighbour
//! hopping carries no Jordan-Wigner string.
//!
//! # Example
//!
//! ```rust
//! use spinsep_data::Hamiltonian;
//! use spinsep_sim::hamiltonian::HubbardModel;
//!
//! let model = HubbardModel::from_hamiltonian(&Hamiltonian::new(3, 1.0, 4.0));
//! // 2 bonds × 2 spins of hopping + 3 on-site terms.
//! assert_eq!(model.n_terms(), 7);
//! ```

use serde::{Deserialize, Serialize};

use spinsep_data::Hamiltonian;

/// Spin species of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    /// Spin-up chain, qubits `0..L`.
    Up,
    /// Spin-down chain, qubits `L..2L`.
    Down,
}

impl Spin {
    /// Both species, up first.
    pub const BOTH: [Spin; 2] = [Spin::Up, Spin::Down];
}

/// One term of the Hamiltonian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HubbardTerm {
    /// `-j (c†_b c_{b+1} + h.c.)` on one spin chain.
    Hopping {
        /// Left site of the bond.
        bond: usize,
        /// Chain the fermion moves in.
        spin: Spin,
        /// Hopping amplitude.
        j: f64,
    },
    /// `u n_{i↑} n_{i↓}`.
    OnSite {
        /// Site index.
        site: usize,
        /// Interaction strength.
        u: f64,
    },
    /// `v n_b n_{b+1}` with `n = n↑ + n↓`.
    NearestNeighbour {
        /// Left site of the bond.
        bond: usize,
        /// Interaction strength.
        v: f64,
    },
    /// `ε n_{i,σ}`.
    Local {
        /// Site index.
        site: usize,
        /// Chain the potential acts on.
        spin: Spin,
        /// Local energy.
        epsilon: f64,
    },
}

impl HubbardTerm {
    /// True for terms that are diagonal in the occupation basis.
    pub fn is_diagonal(&self) -> bool {
        !matches!(self, HubbardTerm::Hopping { .. })
    }
}

/// The Hamiltonian of one chain pair as a list of non-zero terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubbardModel {
    sites_count: usize,
    terms: Vec<HubbardTerm>,
}

impl HubbardModel {
    /// Decompose a Hamiltonian into its non-zero terms.
    pub fn from_hamiltonian(hamiltonian: &Hamiltonian) -> Self {
        let mut terms = Vec::new();

        for (bond, j) in hamiltonian.j_values().into_iter().enumerate() {
            if j != 0.0 {
                for spin in Spin::BOTH {
                    terms.push(HubbardTerm::Hopping { bond, spin, j });
                }
            }
        }
        for (site, u) in hamiltonian.u_values().into_iter().enumerate() {
            if u != 0.0 {
                terms.push(HubbardTerm::OnSite { site, u });
            }
        }
        for (bond, v) in hamiltonian.v_values().into_iter().enumerate() {
            if v != 0.0 {
                terms.push(HubbardTerm::NearestNeighbour { bond, v });
            }
        }
        for (spin, fields) in [
            (Spin::Up, hamiltonian.local_up()),
            (Spin::Down, hamiltonian.local_down()),
        ] {
            for (site, epsilon) in fields.into_iter().enumerate() {
                if epsilon != 0.0 {
                    terms.push(HubbardTerm::Local {
                        site,
                        spin,
                        epsilon,
                    });
                }
            }
        }

        Self {
            sites_count: hamiltonian.sites_count,
            terms,
        }
    }

    /// Number of sites per chain.
    pub fn sites_count(&self) -> usize {
        self.sites_count
    }

    /// Number of qubits (two per site).
    pub fn qubits_count(&self) -> usize {
        2 * self.sites_count
    }

    /// All terms.
    pub fn terms(&self) -> &[HubbardTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Qubit holding the occupation of `site` in the `spin` chain.
    pub fn qubit(&self, site: usize, spin: Spin) -> usize {
        match spin {
            Spin::Up => site,
            Spin::Down => self.sites_count + site,
        }
    }

    /// Hopping terms on bonds of the given parity (`0` even, `1` odd).
    ///
    /// Bonds of equal parity share no site, so their gates commute.
    pub fn hopping_layer(&self, parity: usize) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.terms.iter().filter_map(move |term| match *term {
            HubbardTerm::Hopping { bond, spin, j } if bond % 2 == parity => {
                Some((self.qubit(bond, spin), self.qubit(bond + 1, spin), j))
            }
            _ => None,
        })
    }

    /// Energy of a computational basis state under the diagonal terms.
    pub fn diagonal_energy(&self, basis_state: usize) -> f64 {
        let occupied = |q: usize| ((basis_state >> q) & 1) as f64;
        let charge = |site: usize| occupied(site) + occupied(self.sites_count + site);

        self.terms
            .iter()
            .map(|term| match *term {
                HubbardTerm::Hopping { .. } => 0.0,
                HubbardTerm::OnSite { site, u } => {
                    u * occupied(self.qubit(site, Spin::Up)) * occupied(self.qubit(site, Spin::Down))
                }
                HubbardTerm::NearestNeighbour { bond, v } => v * charge(bond) * charge(bond + 1),
                HubbardTerm::Local {
                    site,
                    spin,
                    epsilon,
                } => epsilon * occupied(self.qubit(site, spin)),
            })
            .sum()
    }
}
