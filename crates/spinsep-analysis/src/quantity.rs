//! Catalog of derived quantities and their computed data.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A named quantity a bundle can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Fraction of shots with the prepared particle numbers.
    PostSelection,
    /// Per-step scale of measured against exact density deviations.
    Scaling,
    UpDownDensity,
    UpDownPositionAverage,
    UpDownPositionAverageDt,
    UpDownSpreading,
    UpDownSpreadingDt,
    ChargeSpinDensity,
    ChargeSpinPositionAverage,
    ChargeSpinPositionAverageDt,
    ChargeSpinSpreading,
    ChargeSpinSpreadingDt,
}

/// Spin basis of a density-derived quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Basis {
    UpDown,
    ChargeSpin,
}

/// Per-chain observable of a density-derived quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Observable {
    Density,
    PositionAverage,
    PositionAverageDt,
    Spreading,
    SpreadingDt,
}

impl Quantity {
    /// Every quantity, in catalog order.
    pub const ALL: [Quantity; 12] = [
        Quantity::PostSelection,
        Quantity::Scaling,
        Quantity::UpDownDensity,
        Quantity::UpDownPositionAverage,
        Quantity::UpDownPositionAverageDt,
        Quantity::UpDownSpreading,
        Quantity::UpDownSpreadingDt,
        Quantity::ChargeSpinDensity,
        Quantity::ChargeSpinPositionAverage,
        Quantity::ChargeSpinPositionAverageDt,
        Quantity::ChargeSpinSpreading,
        Quantity::ChargeSpinSpreadingDt,
    ];

    /// Snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::PostSelection => "post_selection",
            Quantity::Scaling => "scaling",
            Quantity::UpDownDensity => "up_down_density",
            Quantity::UpDownPositionAverage => "up_down_position_average",
            Quantity::UpDownPositionAverageDt => "up_down_position_average_dt",
            Quantity::UpDownSpreading => "up_down_spreading",
            Quantity::UpDownSpreadingDt => "up_down_spreading_dt",
            Quantity::ChargeSpinDensity => "charge_spin_density",
            Quantity::ChargeSpinPositionAverage => "charge_spin_position_average",
            Quantity::ChargeSpinPositionAverageDt => "charge_spin_position_average_dt",
            Quantity::ChargeSpinSpreading => "charge_spin_spreading",
            Quantity::ChargeSpinSpreadingDt => "charge_spin_spreading_dt",
        }
    }

    /// Names of the series this quantity produces.
    pub fn series_names(self) -> &'static [&'static str] {
        match self.decompose() {
            None => &["value"],
            Some((Basis::UpDown, _)) => &["up", "down"],
            Some((Basis::ChargeSpin, _)) => &["charge", "spin"],
        }
    }

    /// True for site-resolved quantities (one value per site and step).
    pub fn is_profile(self) -> bool {
        matches!(self.decompose(), Some((_, Observable::Density)))
    }

    /// True if computing the quantity needs the cached reference trajectory.
    pub fn needs_reference(self) -> bool {
        self != Quantity::PostSelection
    }

    /// Human-readable label of the value axis.
    pub fn axis_label(self) -> &'static str {
        match self.decompose() {
            None if self == Quantity::PostSelection => "post-selected fraction",
            None => "scaling factor",
            Some((_, Observable::Density)) => "density",
            Some((_, Observable::PositionAverage)) => "position average",
            Some((_, Observable::PositionAverageDt)) => "d/dt position average",
            Some((_, Observable::Spreading)) => "spreading",
            Some((_, Observable::SpreadingDt)) => "d/dt spreading",
        }
    }

    pub(crate) fn decompose(self) -> Option<(Basis, Observable)> {
        let pair = match self {
            Quantity::PostSelection | Quantity::Scaling => return None,
            Quantity::UpDownDensity => (Basis::UpDown, Observable::Density),
            Quantity::UpDownPositionAverage => (Basis::UpDown, Observable::PositionAverage),
            Quantity::UpDownPositionAverageDt => (Basis::UpDown, Observable::PositionAverageDt),
            Quantity::UpDownSpreading => (Basis::UpDown, Observable::Spreading),
            Quantity::UpDownSpreadingDt => (Basis::UpDown, Observable::SpreadingDt),
            Quantity::ChargeSpinDensity => (Basis::ChargeSpin, Observable::Density),
            Quantity::ChargeSpinPositionAverage => {
                (Basis::ChargeSpin, Observable::PositionAverage)
            }
            Quantity::ChargeSpinPositionAverageDt => {
                (Basis::ChargeSpin, Observable::PositionAverageDt)
            }
            Quantity::ChargeSpinSpreading => (Basis::ChargeSpin, Observable::Spreading),
            Quantity::ChargeSpinSpreadingDt => (Basis::ChargeSpin, Observable::SpreadingDt),
        };
        Some(pair)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quantity {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or_else(|| AnalysisError::UnknownQuantity(s.to_string()))
    }
}

/// Which spread of the instances to draw around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBand {
    /// Population standard deviation.
    #[default]
    StdDev,
    /// Standard error of the mean.
    StdError,
    /// No band.
    None,
}

/// One named series of a quantity; arrays have shape `(steps, width)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub mean: Array2<f64>,
    pub std: Array2<f64>,
    pub stderr: Array2<f64>,
    /// Exact reference, for quantities that have one.
    pub exact: Option<Array2<f64>>,
}

impl Series {
    /// Values per step (1, or the number of sites for profiles).
    pub fn width(&self) -> usize {
        self.mean.ncols()
    }

    /// Half-width of the requested error band, if any.
    pub fn band(&self, band: ErrorBand) -> Option<&Array2<f64>> {
        match band {
            ErrorBand::StdDev => Some(&self.std),
            ErrorBand::StdError => Some(&self.stderr),
            ErrorBand::None => None,
        }
    }
}

/// A quantity evaluated on every step of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityData {
    pub quantity: Quantity,
    pub steps: Vec<usize>,
    pub times: Vec<f64>,
    /// Number of experiment instances averaged.
    pub instances: usize,
    pub series: Vec<Series>,
}

impl QuantityData {
    /// Series by name.
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Common width of all series.
    pub fn width(&self) -> usize {
        self.series.first().map_or(0, Series::width)
    }
}
