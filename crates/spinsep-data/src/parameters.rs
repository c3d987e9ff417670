//! Fermi-Hubbard problem parameters.
//!
//! A problem instance is a 1D chain of `L` sites with two spin species:
//!
//!   H = -Σ_b J_b Σ_σ (c†_{b,σ} c_{b+1,σ} + h.c.)
//!       + Σ_i U_i n_{i,↑} n_{i,↓}
//!       + Σ_b V_b n_b n_{b+1}
//!       + Σ_{i,σ} ε_{i,σ} n_{i,σ}
//!
//! with `ε_{i,↑} = local_charge_i + local_spin_i + μ_↑` and
//! `ε_{i,↓} = local_charge_i − local_spin_i + μ_↓`.
//!
//! # Example
//!
//! ```rust
//! use spinsep_data::parameters::{
//!     ChainInitialState, FermiHubbardParameters, Hamiltonian, IndependentChainsInitialState,
//!     Layout,
//! };
//!
//! let chain = ChainInitialState::GaussianTrappingPotential {
//!     particles: 2,
//!     center: 0.5,
//!     sigma: 1.0 / 7.0,
//!     scale: -4.0,
//! };
//! let params = FermiHubbardParameters::new(
//!     Hamiltonian::new(6, 1.0, 4.0),
//!     IndependentChainsInitialState::new(chain.clone(), chain),
//!     Layout::line(6, [0, 0]),
//!     0.3,
//! );
//! assert!(params.validate().is_ok());
//! assert_eq!(params.qubits_count(), 12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// A coupling that is either uniform along the chain or given per site/bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Couplings {
    /// Same value everywhere.
    Uniform(f64),
    /// One value per site (or per bond).
    PerSite(Vec<f64>),
}

impl Couplings {
    /// Expand to exactly `len` values.
    ///
    /// A `PerSite` vector of the wrong length is returned as-is; callers run
    /// [`Hamiltonian::validate`] first.
    pub fn resolve(&self, len: usize) -> Vec<f64> {
        match self {
            Couplings::Uniform(value) => vec![*value; len],
            Couplings::PerSite(values) => values.clone(),
        }
    }

    fn check(&self, len: usize, what: &str) -> DataResult<()> {
        let values = match self {
            Couplings::Uniform(value) => std::slice::from_ref(value),
            Couplings::PerSite(values) if values.len() != len => {
                return Err(DataError::InvalidParameters(format!(
                    "{what} has {} values, expected {len}",
                    values.len()
                )));
            }
            Couplings::PerSite(values) => values.as_slice(),
        };
        check_finite(values, what)
    }
}

impl Default for Couplings {
    fn default() -> Self {
        Couplings::Uniform(0.0)
    }
}

impl From<f64> for Couplings {
    fn from(value: f64) -> Self {
        Couplings::Uniform(value)
    }
}

impl From<Vec<f64>> for Couplings {
    fn from(values: Vec<f64>) -> Self {
        Couplings::PerSite(values)
    }
}

fn check_finite(values: &[f64], what: &str) -> DataResult<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(value) => Err(DataError::InvalidParameters(format!(
            "{what} must be finite, got {value}"
        ))),
        None => Ok(()),
    }
}

/// Hamiltonian couplings of a Fermi-Hubbard chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hamiltonian {
    /// Number of sites `L`.
    pub sites_count: usize,
    /// Hopping per bond (`L-1` values).
    pub j: Couplings,
    /// On-site interaction per site.
    pub u: Couplings,
    /// Nearest-neighbour density-density interaction per bond.
    #[serde(default)]
    pub v: Couplings,
    /// Spin-independent local potential per site.
    #[serde(default)]
    pub local_charge: Couplings,
    /// Spin-dependent local potential per site.
    #[serde(default)]
    pub local_spin: Couplings,
    /// Chemical potential of the spin-up chain.
    #[serde(default)]
    pub mu_up: f64,
    /// Chemical potential of the spin-down chain.
    #[serde(default)]
    pub mu_down: f64,
}

impl Hamiltonian {
    /// Uniform hopping `j` and interaction `u`, all other couplings zero.
    pub fn new(sites_count: usize, j: impl Into<Couplings>, u: impl Into<Couplings>) -> Self {
        Self {
            sites_count,
            j: j.into(),
            u: u.into(),
            v: Couplings::default(),
            local_charge: Couplings::default(),
            local_spin: Couplings::default(),
            mu_up: 0.0,
            mu_down: 0.0,
        }
    }

    /// Set the nearest-neighbour interaction.
    #[must_use]
    pub fn with_v(mut self, v: impl Into<Couplings>) -> Self {
        self.v = v.into();
        self
    }

    /// Set the local charge and spin potentials.
    #[must_use]
    pub fn with_local_fields(
        mut self,
        local_charge: impl Into<Couplings>,
        local_spin: impl Into<Couplings>,
    ) -> Self {
        self.local_charge = local_charge.into();
        self.local_spin = local_spin.into();
        self
    }

    /// Set the chemical potentials.
    #[must_use]
    pub fn with_chemical_potentials(mut self, mu_up: f64, mu_down: f64) -> Self {
        self.mu_up = mu_up;
        self.mu_down = mu_down;
        self
    }

    fn bonds(&self) -> usize {
        self.sites_count.saturating_sub(1)
    }

    /// Hopping amplitudes, one per bond.
    pub fn j_values(&self) -> Vec<f64> {
        self.j.resolve(self.bonds())
    }

    /// On-site interactions, one per site.
    pub fn u_values(&self) -> Vec<f64> {
        self.u.resolve(self.sites_count)
    }

    /// Nearest-neighbour interactions, one per bond.
    pub fn v_values(&self) -> Vec<f64> {
        self.v.resolve(self.bonds())
    }

    /// Local energies seen by the spin-up chain.
    pub fn local_up(&self) -> Vec<f64> {
        self.local_fields(self.mu_up, 1.0)
    }

    /// Local energies seen by the spin-down chain.
    pub fn local_down(&self) -> Vec<f64> {
        self.local_fields(self.mu_down, -1.0)
    }

    fn local_fields(&self, mu: f64, spin_sign: f64) -> Vec<f64> {
        let charge = self.local_charge.resolve(self.sites_count);
        let spin = self.local_spin.resolve(self.sites_count);
        charge
            .iter()
            .zip(&spin)
            .map(|(c, s)| c + spin_sign * s + mu)
            .collect()
    }

    /// Check coupling vector lengths against the chain size and reject
    /// non-finite values.
    pub fn validate(&self) -> DataResult<()> {
        if self.sites_count < 2 {
            return Err(DataError::InvalidParameters(format!(
                "chain needs at least 2 sites, got {}",
                self.sites_count
            )));
        }
        self.j.check(self.bonds(), "j")?;
        self.u.check(self.sites_count, "u")?;
        self.v.check(self.bonds(), "v")?;
        self.local_charge.check(self.sites_count, "local_charge")?;
        self.local_spin.check(self.sites_count, "local_spin")?;
        check_finite(&[self.mu_up], "mu_up")?;
        check_finite(&[self.mu_down], "mu_down")
    }
}

/// Initial state of a single spin chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainInitialState {
    /// Lowest `particles` orbitals of a free chain in a Gaussian potential
    /// `scale · exp(-½((x - center)/sigma)²)`, `x = i/(L-1)`.
    GaussianTrappingPotential {
        /// Number of fermions.
        particles: usize,
        /// Trap centre in relative chain coordinates.
        center: f64,
        /// Trap width in relative chain coordinates.
        sigma: f64,
        /// Potential depth (negative traps).
        scale: f64,
    },
    /// One fermion localised on a site.
    FixedSingleParticle {
        /// Occupied site.
        site: usize,
    },
    /// One fermion spread evenly over the chain.
    UniformSingleParticle,
    /// One fermion in a Gaussian wave packet with momentum `k`.
    PhasedGaussianSingleParticle {
        /// Phase gradient per site.
        k: f64,
        /// Packet width in relative chain coordinates.
        sigma: f64,
        /// Packet centre in relative chain coordinates.
        position: f64,
    },
}

impl ChainInitialState {
    /// Number of fermions in this chain.
    pub fn particles(&self) -> usize {
        match self {
            ChainInitialState::GaussianTrappingPotential { particles, .. } => *particles,
            _ => 1,
        }
    }

    fn validate(&self, sites_count: usize, chain: &str) -> DataResult<()> {
        match self {
            ChainInitialState::GaussianTrappingPotential {
                particles,
                center,
                sigma,
                scale,
            } => {
                check_finite(&[*center, *sigma, *scale], &format!("{chain} chain trap"))?;
                if *particles > sites_count {
                    return Err(DataError::InvalidParameters(format!(
                        "{chain} chain holds {particles} particles on {sites_count} sites"
                    )));
                }
                if *sigma <= 0.0 {
                    return Err(DataError::InvalidParameters(format!(
                        "{chain} chain trap width must be positive, got {sigma}"
                    )));
                }
            }
            ChainInitialState::FixedSingleParticle { site } if *site >= sites_count => {
                return Err(DataError::InvalidParameters(format!(
                    "{chain} chain particle on site {site}, chain has {sites_count} sites"
                )));
            }
            ChainInitialState::PhasedGaussianSingleParticle { k, sigma, position } => {
                check_finite(&[*k, *sigma, *position], &format!("{chain} chain packet"))?;
                if *sigma <= 0.0 {
                    return Err(DataError::InvalidParameters(format!(
                        "{chain} chain packet width must be positive, got {sigma}"
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Independent initial states of the spin-up and spin-down chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentChainsInitialState {
    /// Spin-up chain.
    pub up: ChainInitialState,
    /// Spin-down chain.
    pub down: ChainInitialState,
}

impl IndependentChainsInitialState {
    /// Combine two chain states.
    pub fn new(up: ChainInitialState, down: ChainInitialState) -> Self {
        Self { up, down }
    }
}

/// Shape of the qubit embedding on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Two parallel lines of qubits.
    Line,
    /// Zig-zag embedding.
    Zigzag,
}

/// Placement of the two chains on the processor grid.
///
/// The layout only identifies which physical qubits were used; it does not
/// enter the simulated dynamics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    /// Embedding shape.
    pub kind: LayoutKind,
    /// Number of sites per chain.
    pub size: usize,
    /// Grid coordinates `[row, col]` of the first qubit.
    pub origin: [i32; 2],
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: u16,
}

impl Layout {
    /// Line embedding without rotation.
    pub fn line(size: usize, origin: [i32; 2]) -> Self {
        Self {
            kind: LayoutKind::Line,
            size,
            origin,
            rotation: 0,
        }
    }

    /// Zig-zag embedding without rotation.
    pub fn zigzag(size: usize, origin: [i32; 2]) -> Self {
        Self {
            kind: LayoutKind::Zigzag,
            size,
            origin,
            rotation: 0,
        }
    }

    /// Rotate the embedding.
    #[must_use]
    pub fn with_rotation(mut self, rotation: u16) -> Self {
        self.rotation = rotation;
        self
    }

    /// Short label used as a grouping key, e.g. `line-r4c1-90`.
    pub fn label(&self) -> String {
        let kind = match self.kind {
            LayoutKind::Line => "line",
            LayoutKind::Zigzag => "zigzag",
        };
        format!(
            "{kind}-r{}c{}-{}",
            self.origin[0], self.origin[1], self.rotation
        )
    }

    fn validate(&self, sites_count: usize) -> DataResult<()> {
        if self.size != sites_count {
            return Err(DataError::InvalidParameters(format!(
                "layout size {} does not match {sites_count} sites",
                self.size
            )));
        }
        if self.rotation % 90 != 0 || self.rotation >= 360 {
            return Err(DataError::InvalidParameters(format!(
                "layout rotation must be 0, 90, 180 or 270, got {}",
                self.rotation
            )));
        }
        Ok(())
    }
}

/// A complete Fermi-Hubbard problem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FermiHubbardParameters {
    /// Hamiltonian couplings.
    pub hamiltonian: Hamiltonian,
    /// Initial state of both chains.
    pub initial_state: IndependentChainsInitialState,
    /// Qubit layout on the device.
    pub layout: Layout,
    /// Trotter time step.
    pub dt: f64,
    /// Parasitic controlled-phase angle accompanying every hopping gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parasitic_cphase: Option<f64>,
}

/// Couplings expanded to one value per site or bond, so uniform and
/// per-site spellings of the same chain compare equal.
#[derive(Debug, PartialEq, Serialize)]
struct ResolvedCouplings {
    sites_count: usize,
    j: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
    local_up: Vec<f64>,
    local_down: Vec<f64>,
}

impl From<&Hamiltonian> for ResolvedCouplings {
    fn from(h: &Hamiltonian) -> Self {
        Self {
            sites_count: h.sites_count,
            j: h.j_values(),
            u: h.u_values(),
            v: h.v_values(),
            local_up: h.local_up(),
            local_down: h.local_down(),
        }
    }
}

/// Fields that determine the dynamics.
#[derive(Debug, PartialEq, Serialize)]
struct PhysicsView<'a> {
    hamiltonian: ResolvedCouplings,
    initial_state: &'a IndependentChainsInitialState,
    dt: f64,
    parasitic_cphase: Option<f64>,
}

impl FermiHubbardParameters {
    /// Create a new problem instance without parasitic phase.
    pub fn new(
        hamiltonian: Hamiltonian,
        initial_state: IndependentChainsInitialState,
        layout: Layout,
        dt: f64,
    ) -> Self {
        Self {
            hamiltonian,
            initial_state,
            layout,
            dt,
            parasitic_cphase: None,
        }
    }

    /// Number of sites per chain.
    pub fn sites_count(&self) -> usize {
        self.hamiltonian.sites_count
    }

    /// Number of qubits (two per site).
    pub fn qubits_count(&self) -> usize {
        2 * self.sites_count()
    }

    /// Number of spin-up fermions.
    pub fn particles_up(&self) -> usize {
        self.initial_state.up.particles()
    }

    /// Number of spin-down fermions.
    pub fn particles_down(&self) -> usize {
        self.initial_state.down.particles()
    }

    /// Replace the layout, keeping the physics.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> DataResult<()> {
        self.hamiltonian.validate()?;
        let sites = self.sites_count();
        self.initial_state.up.validate(sites, "up")?;
        self.initial_state.down.validate(sites, "down")?;
        self.layout.validate(sites)?;
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(DataError::InvalidParameters(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        if let Some(angle) = self.parasitic_cphase {
            check_finite(&[angle], "parasitic_cphase")?;
        }
        Ok(())
    }

    fn physics(&self) -> PhysicsView<'_> {
        PhysicsView {
            hamiltonian: ResolvedCouplings::from(&self.hamiltonian),
            initial_state: &self.initial_state,
            dt: self.dt,
            parasitic_cphase: self.parasitic_cphase,
        }
    }

    /// True if both instances describe the same dynamics, ignoring layout
    /// and whether couplings are spelled uniform or per site.
    pub fn physics_equivalent(&self, other: &Self) -> bool {
        self.physics() == other.physics()
    }

    /// Canonical JSON of the resolved physics fields; equal for
    /// physics-equivalent instances regardless of layout.
    pub fn fingerprint(&self) -> DataResult<String> {
        Ok(serde_json::to_string(&self.physics())?)
    }
}
