use crate::model::{TdmError, TripPurpose};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// exponential decay exponent `m` per purpose, in 1 / minutes, used in the
/// friction factor `F = exp(-m * t)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct DecayRates(pub HashMap<TripPurpose, f64>);

impl Default for DecayRates {
    fn default() -> Self {
        DecayRates(HashMap::from([
            (TripPurpose::Hbw, 0.08),
            (TripPurpose::Hbo, 0.12),
            (TripPurpose::Nhb, 0.10),
        ]))
    }
}

impl DecayRates {
    pub fn get_rate(&self, purpose: &TripPurpose) -> Result<f64, TdmError> {
        let rate = self.0.get(purpose).copied().ok_or_else(|| {
            TdmError::ConfigurationError(format!("no decay rate configured for {purpose}"))
        })?;
        DecayRates::validate_rate(purpose, rate)?;
        Ok(rate)
    }

    pub fn validate_rate(purpose: &TripPurpose, rate: f64) -> Result<(), TdmError> {
        if !rate.is_finite() || rate < 0.0 {
            Err(TdmError::ConfigurationError(format!(
                "{purpose} decay rate must be a non-negative number, found {rate}"
            )))
        } else {
            Ok(())
        }
    }
}
