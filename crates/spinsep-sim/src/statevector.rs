//! State-vector representation of two fermion chains.

use num_complex::Complex64;

use crate::error::{SimError, SimResult};
use crate::orbitals::{Orbitals, slater_amplitudes};

/// Widest state vector the simulator will allocate (2^20 amplitudes).
pub const MAX_QUBITS: usize = 20;

/// A pure state of the `2L` occupation qubits.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Product of the spin-up and spin-down Slater determinants.
    pub fn from_chains(up: &Orbitals, down: &Orbitals, sites_count: usize) -> SimResult<Self> {
        let num_qubits = 2 * sites_count;
        check_width(num_qubits)?;

        let up_amplitudes = slater_amplitudes(up, sites_count);
        let down_amplitudes = slater_amplitudes(down, sites_count);
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        for (d, down_amp) in down_amplitudes.iter().enumerate() {
            if down_amp.norm_sqr() == 0.0 {
                continue;
            }
            for (u, up_amp) in up_amplitudes.iter().enumerate() {
                amplitudes[u | (d << sites_count)] = up_amp * down_amp;
            }
        }

        let mut sv = Self {
            amplitudes,
            num_qubits,
        };
        sv.normalize()?;
        Ok(sv)
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Squared norm of the state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    fn normalize(&mut self) -> SimResult<()> {
        let norm = self.norm_sqr().sqrt();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(SimError::Numerics("state has zero norm".into()));
        }
        for amp in &mut self.amplitudes {
            *amp /= norm;
        }
        Ok(())
    }

    /// Measurement probabilities of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Probability that each qubit is occupied.
    pub fn occupations(&self) -> Vec<f64> {
        let mut occupations = vec![0.0; self.num_qubits];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            if p == 0.0 {
                continue;
            }
            for (q, occ) in occupations.iter_mut().enumerate() {
                if i & (1 << q) != 0 {
                    *occ += p;
                }
            }
        }
        occupations
    }

    /// Hopping rotation between neighbouring qubits `q1`, `q2`:
    /// `exp(iθ(|10⟩⟨01| + |01⟩⟨10|))`, followed by the phase
    /// `exp(-iφ)` on `|11⟩`.
    pub fn apply_hopping(&mut self, q1: usize, q2: usize, theta: f64, cphase: f64) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        let (sin, cos) = theta.sin_cos();
        let i_sin = Complex64::new(0.0, sin);
        let both = Complex64::from_polar(1.0, -cphase);
        for i in 0..(1 << self.num_qubits) {
            let b1 = (i & mask1) != 0;
            let b2 = (i & mask2) != 0;
            if b1 && !b2 {
                let j = (i & !mask1) | mask2;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = cos * a + i_sin * b;
                self.amplitudes[j] = i_sin * a + cos * b;
            } else if b1 && b2 && cphase != 0.0 {
                self.amplitudes[i] *= both;
            }
        }
    }

    /// Multiply every amplitude by the matching precomputed phase.
    pub fn apply_diagonal(&mut self, phases: &[Complex64]) {
        for (amp, phase) in self.amplitudes.iter_mut().zip(phases) {
            *amp *= phase;
        }
    }
}

/// Convert measurement outcome to bitstring (character `i` is qubit `i`).
pub fn outcome_to_bitstring(outcome: usize, num_qubits: usize) -> String {
    format!("{:0width$b}", outcome, width = num_qubits)
        .chars()
        .rev()
        .collect()
}

fn check_width(num_qubits: usize) -> SimResult<()> {
    if num_qubits > MAX_QUBITS {
        return Err(SimError::TooManyQubits {
            qubits: num_qubits,
            max: MAX_QUBITS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn localised(site: usize, sites_count: usize) -> Orbitals {
        let mut orbital = vec![Complex64::new(0.0, 0.0); sites_count];
        orbital[site] = Complex64::new(1.0, 0.0);
        vec![orbital]
    }

    #[test]
    fn test_too_wide_rejected() {
        let sites = MAX_QUBITS / 2 + 1;
        assert!(matches!(
            Statevector::from_chains(&localised(0, sites), &localised(1, sites), sites),
            Err(SimError::TooManyQubits { .. })
        ));
    }

    #[test]
    fn test_from_chains_places_fermions() {
        // Up fermion on site 0, down fermion on site 2 of a 3-site chain.
        let sv = Statevector::from_chains(&localised(0, 3), &localised(2, 3), 3).unwrap();
        let occ = sv.occupations();
        assert_eq!(occ, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(outcome_to_bitstring(0b100001, 6), "100001");
        assert_eq!(outcome_to_bitstring(0b000011, 6), "110000");
    }

    #[test]
    fn test_empty_chain_is_vacuum() {
        let sv = Statevector::from_chains(&localised(1, 2), &Vec::new(), 2).unwrap();
        assert_eq!(sv.num_qubits(), 4);
        assert!(approx_eq(sv.amplitudes()[0b0010], Complex64::new(1.0, 0.0)));
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hopping_quarter_period_moves_fermion() {
        let mut sv = Statevector::from_chains(&localised(0, 2), &Vec::new(), 2).unwrap();
        sv.apply_hopping(0, 1, std::f64::consts::FRAC_PI_2, 0.0);
        assert!(approx_eq(sv.amplitudes[0b10], Complex64::new(0.0, 1.0)));
        assert!(sv.amplitudes[0b01].norm() < 1e-12);
    }

    #[test]
    fn test_hopping_leaves_doubly_occupied_pair_alone_without_cphase() {
        // One site per chain: qubit 0 is up, qubit 1 is down.
        let mut sv = Statevector::from_chains(&localised(0, 1), &localised(0, 1), 1).unwrap();
        sv.apply_hopping(0, 1, 0.7, 0.0);
        assert!(approx_eq(sv.amplitudes[0b11], Complex64::new(1.0, 0.0)));
        sv.apply_hopping(0, 1, 0.7, 0.5);
        assert!(approx_eq(
            sv.amplitudes[0b11],
            Complex64::from_polar(1.0, -0.5)
        ));
    }

    #[test]
    fn test_diagonal_phases_keep_probabilities() {
        let mut sv = Statevector::from_chains(&localised(0, 2), &localised(1, 2), 2).unwrap();
        sv.apply_hopping(0, 1, 0.4, 0.0);
        let before = sv.probabilities();
        let phases: Vec<_> = (0..before.len())
            .map(|i| Complex64::from_polar(1.0, 0.3 * i as f64))
            .collect();
        sv.apply_diagonal(&phases);
        for (a, b) in before.iter().zip(sv.probabilities()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
