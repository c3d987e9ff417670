//! Analysis configuration.
//!
//! Loaded from YAML; every field is optional:
//!
//! ```yaml
//! steps: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
//! rescale_steps: [2, 3, 4, 5, 6, 7, 8]
//! strategy: linear
//! parasitic_cphase: 0.138
//! error_band: std_error
//! shared_rescaling: true
//! quantities:
//!   - charge_spin_density
//!   - charge_spin_spreading
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::quantity::{ErrorBand, Quantity};
use crate::rescaling::StrategyKind;

/// Settings of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Steps to analyse (default: steps common to every experiment).
    pub steps: Option<Vec<usize>>,
    /// Steps entering the rescaling fit (default: all analysed steps).
    pub rescale_steps: Option<Vec<usize>>,
    /// Rescaling fit criterion.
    pub strategy: StrategyKind,
    /// Parasitic controlled phase to include in the exact numerics.
    pub parasitic_cphase: Option<f64>,
    /// Error band drawn in charts.
    pub error_band: ErrorBand,
    /// Quantities to report and plot.
    pub quantities: Vec<Quantity>,
    /// Fit one rescaling across all bundles instead of one per bundle.
    pub shared_rescaling: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            steps: None,
            rescale_steps: None,
            strategy: StrategyKind::default(),
            parasitic_cphase: None,
            error_band: ErrorBand::default(),
            quantities: Quantity::ALL.to_vec(),
            shared_rescaling: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn from_file(path: &Path) -> AnalysisResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Serialise to YAML.
    pub fn to_yaml(&self) -> AnalysisResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.quantities.is_empty() {
            return Err(AnalysisError::Config("no quantities selected".into()));
        }
        if let (Some(steps), Some(rescale)) = (&self.steps, &self.rescale_steps) {
            if let Some(step) = rescale.iter().find(|s| !steps.contains(s)) {
                return Err(AnalysisError::Config(format!(
                    "rescale step {step} is not among the analysed steps"
                )));
            }
        }
        if matches!(&self.steps, Some(steps) if steps.is_empty()) {
            return Err(AnalysisError::Config("step list is empty".into()));
        }
        if let Some(angle) = self.parasitic_cphase {
            if !angle.is_finite() {
                return Err(AnalysisError::Config(format!(
                    "parasitic_cphase must be finite, got {angle}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AnalysisConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.quantities.len(), Quantity::ALL.len());
    }

    #[test]
    fn test_full_document() {
        let yaml = r"
steps: [0, 1, 2, 3]
rescale_steps: [1, 2]
strategy: constant
parasitic_cphase: 0.138
error_band: std_error
shared_rescaling: false
quantities: [post_selection, charge_spin_spreading_dt]
";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.strategy, StrategyKind::Constant);
        assert_eq!(config.error_band, ErrorBand::StdError);
        assert_eq!(
            config.quantities,
            vec![Quantity::PostSelection, Quantity::ChargeSpinSpreadingDt]
        );
        assert!(!config.shared_rescaling);
        assert_eq!(AnalysisConfig::from_yaml(&config.to_yaml().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_rescale_steps_outside_steps_rejected() {
        let err = AnalysisConfig::from_yaml("steps: [0, 1]\nrescale_steps: [4]\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(AnalysisConfig::from_yaml("stategy: linear\n").is_err());
        assert!(AnalysisConfig::from_yaml("quantities: [charge]\n").is_err());
    }
}
