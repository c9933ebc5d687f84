use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// household-level explanatory variables of a trip purpose model.
///
/// at the survey level, `Log2Income` is log2 of household income in thousands
/// of dollars and the remaining predictors are 0/1 indicators. when a fitted
/// model is applied to a zone, the indicators are replaced by the zone share
/// of households with that property and the income term uses the zone median
/// income. evaluating a household regression on zone aggregates is an
/// ecological-inference approximation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Predictor {
    Log2Income,
    HasChildren,
    HasElderly,
    OwnsHome,
    HasVehicle,
}

impl Predictor {
    /// the predictor set used when a purpose does not configure its own.
    pub const DEFAULT: [Predictor; 4] = [
        Predictor::Log2Income,
        Predictor::HasChildren,
        Predictor::OwnsHome,
        Predictor::HasElderly,
    ];
}

impl Display for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Predictor::Log2Income => "log2_income",
            Predictor::HasChildren => "has_children",
            Predictor::HasElderly => "has_elderly",
            Predictor::OwnsHome => "owns_home",
            Predictor::HasVehicle => "has_vehicle",
        };
        write!(f, "{s}")
    }
}

/// log2 of an income in dollars expressed in thousands. incomes that are not
/// strictly positive have no logarithm and return None; callers decide how
/// to handle them.
pub fn log2_income_thousands(income_dollars: f64) -> Option<f64> {
    if income_dollars.is_finite() && income_dollars > 0.0 {
        Some((income_dollars / 1000.0).log2())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_income() {
        assert_eq!(log2_income_thousands(64_000.0), Some(6.0));
        assert_eq!(log2_income_thousands(0.0), None);
        assert_eq!(log2_income_thousands(-10.0), None);
        assert_eq!(log2_income_thousands(f64::NAN), None);
    }
}
