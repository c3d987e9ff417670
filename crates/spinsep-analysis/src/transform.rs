//! Transforms applied to problem parameters before the reference is simulated.

use std::fmt;

use spinsep_data::FermiHubbardParameters;

/// Maps the measured problem onto the problem whose exact numerics the
/// measurements are compared against.
pub trait NumericsTransform: fmt::Debug + Send + Sync {
    /// Transformed parameters to simulate.
    fn apply(&self, params: &FermiHubbardParameters) -> FermiHubbardParameters;

    /// Short name for logs and reports.
    fn name(&self) -> String;
}

/// Include the device's parasitic controlled phase in the reference, so
/// the hopping gates of the simulation match those of the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParasiticCphaseCompensation {
    /// Parasitic phase per hopping gate, in radians.
    pub angle: f64,
}

impl ParasiticCphaseCompensation {
    /// Create a compensation for `angle` radians.
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }
}

impl NumericsTransform for ParasiticCphaseCompensation {
    fn apply(&self, params: &FermiHubbardParameters) -> FermiHubbardParameters {
        let mut transformed = params.clone();
        transformed.parasitic_cphase = Some(self.angle);
        transformed
    }

    fn name(&self) -> String {
        format!("parasitic_cphase({})", self.angle)
    }
}
