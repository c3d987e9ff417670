//! Single-particle orbitals of the initial chain states.
//!
//! Every supported chain state is a Slater determinant of orthonormal
//! orbitals; a single-particle state is the one-orbital case.

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;

use spinsep_data::ChainInitialState;

use crate::error::{SimError, SimResult};

/// Orbital amplitudes, one vector of length `L` per fermion.
pub type Orbitals = Vec<Vec<Complex64>>;

/// Relative position of site `i` on a chain of `sites_count` sites.
fn relative_position(site: usize, sites_count: usize) -> f64 {
    if sites_count <= 1 {
        0.0
    } else {
        site as f64 / (sites_count - 1) as f64
    }
}

fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    (-0.5 * ((x - center) / sigma).powi(2)).exp()
}

/// Build the orbitals of a chain state on `sites_count` sites.
pub fn chain_orbitals(state: &ChainInitialState, sites_count: usize) -> SimResult<Orbitals> {
    match *state {
        ChainInitialState::GaussianTrappingPotential {
            particles,
            center,
            sigma,
            scale,
        } => trapped_orbitals(sites_count, particles, |x| scale * gaussian(x, center, sigma)),
        ChainInitialState::FixedSingleParticle { site } => {
            let mut orbital = vec![Complex64::new(0.0, 0.0); sites_count];
            orbital[site] = Complex64::new(1.0, 0.0);
            Ok(vec![orbital])
        }
        ChainInitialState::UniformSingleParticle => {
            let amplitude = 1.0 / (sites_count as f64).sqrt();
            Ok(vec![vec![Complex64::new(amplitude, 0.0); sites_count]])
        }
        ChainInitialState::PhasedGaussianSingleParticle { k, sigma, position } => {
            let orbital: Vec<Complex64> = (0..sites_count)
                .map(|i| {
                    let envelope = gaussian(relative_position(i, sites_count), position, sigma);
                    Complex64::from_polar(envelope, k * i as f64)
                })
                .collect();
            Ok(vec![normalized(orbital)?])
        }
    }
}

/// Lowest `particles` eigenvectors of a unit-hopping chain in `potential`.
fn trapped_orbitals(
    sites_count: usize,
    particles: usize,
    potential: impl Fn(f64) -> f64,
) -> SimResult<Orbitals> {
    let mut h = DMatrix::<f64>::zeros(sites_count, sites_count);
    for i in 0..sites_count {
        h[(i, i)] = potential(relative_position(i, sites_count));
        if i + 1 < sites_count {
            h[(i, i + 1)] = -1.0;
            h[(i + 1, i)] = -1.0;
        }
    }

    let eigen = SymmetricEigen::new(h);
    if eigen.eigenvalues.iter().any(|e| !e.is_finite()) {
        return Err(SimError::Numerics(
            "trapping potential produced non-finite eigenvalues".into(),
        ));
    }

    let mut order: Vec<usize> = (0..sites_count).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    Ok(order
        .into_iter()
        .take(particles)
        .map(|col| {
            eigen
                .eigenvectors
                .column(col)
                .iter()
                .map(|&a| Complex64::new(a, 0.0))
                .collect()
        })
        .collect())
}

fn normalized(mut orbital: Vec<Complex64>) -> SimResult<Vec<Complex64>> {
    let norm = orbital.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
    if !(norm.is_finite() && norm > 0.0) {
        return Err(SimError::Numerics("orbital has zero norm".into()));
    }
    for a in &mut orbital {
        *a /= norm;
    }
    Ok(orbital)
}

/// Amplitudes of the Slater determinant over occupation bitmasks of `L` sites.
///
/// Entry `mask` holds `det[φ_k(s_m)]` for the occupied sites `s_1 < … < s_N`
/// of `mask`; masks with the wrong particle number are zero.
pub fn slater_amplitudes(orbitals: &Orbitals, sites_count: usize) -> Vec<Complex64> {
    let particles = orbitals.len();
    let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << sites_count];

    for (mask, amplitude) in amplitudes.iter_mut().enumerate() {
        if mask.count_ones() as usize != particles {
            continue;
        }
        if particles == 0 {
            *amplitude = Complex64::new(1.0, 0.0);
            continue;
        }
        let sites: Vec<usize> = (0..sites_count).filter(|s| (mask >> s) & 1 == 1).collect();
        let matrix = DMatrix::<Complex64>::from_fn(particles, particles, |m, k| {
            orbitals[k][sites[m]]
        });
        *amplitude = matrix.determinant();
    }
    amplitudes
}
