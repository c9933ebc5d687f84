use crate::model::TdmError;
use serde::{Deserialize, Serialize};

/// bisection settings for decay rate calibration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalibrationConfig {
    #[serde(default = "CalibrationConfig::default_lower_bound")]
    pub lower_bound: f64,
    #[serde(default = "CalibrationConfig::default_upper_bound")]
    pub upper_bound: f64,
    /// accepted difference between modeled and observed mean trip time, in minutes
    #[serde(default = "CalibrationConfig::default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "CalibrationConfig::default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            lower_bound: CalibrationConfig::default_lower_bound(),
            upper_bound: CalibrationConfig::default_upper_bound(),
            tolerance: CalibrationConfig::default_tolerance(),
            max_iterations: CalibrationConfig::default_max_iterations(),
        }
    }
}

impl CalibrationConfig {
    fn default_lower_bound() -> f64 {
        0.0
    }

    fn default_upper_bound() -> f64 {
        1.0
    }

    fn default_tolerance() -> f64 {
        0.01
    }

    fn default_max_iterations() -> usize {
        60
    }

    pub fn validate(&self) -> Result<(), TdmError> {
        let bounds_ok = self.lower_bound.is_finite()
            && self.upper_bound.is_finite()
            && self.lower_bound >= 0.0
            && self.lower_bound < self.upper_bound;
        if !bounds_ok {
            return Err(TdmError::ConfigurationError(format!(
                "calibration bracket [{}, {}] must be finite, non-negative and increasing",
                self.lower_bound, self.upper_bound
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(TdmError::ConfigurationError(format!(
                "calibration tolerance must be positive, found {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(TdmError::ConfigurationError(String::from(
                "calibration max_iterations must be at least 1",
            )));
        }
        Ok(())
    }
}
