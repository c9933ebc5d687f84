use crate::model::TdmError;
use serde::{Deserialize, Serialize};

/// termination settings of the gravity model solver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BalancerConfig {
    /// maximum relative deviation of any row or column sum from its target
    #[serde(default = "BalancerConfig::default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "BalancerConfig::default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            tolerance: BalancerConfig::default_tolerance(),
            max_iterations: BalancerConfig::default_max_iterations(),
        }
    }
}

impl BalancerConfig {
    pub fn new(tolerance: f64, max_iterations: usize) -> BalancerConfig {
        BalancerConfig {
            tolerance,
            max_iterations,
        }
    }

    fn default_tolerance() -> f64 {
        0.01
    }

    fn default_max_iterations() -> usize {
        10_000
    }

    pub fn validate(&self) -> Result<(), TdmError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(TdmError::ConfigurationError(format!(
                "solver tolerance must be a positive number, found {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(TdmError::ConfigurationError(String::from(
                "solver max_iterations must be at least 1",
            )));
        }
        Ok(())
    }
}
