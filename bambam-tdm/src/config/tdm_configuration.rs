use crate::{
    app::TdmCliError,
    model::{
        aggregation::AggregationConfig,
        calibration::CalibrationConfig,
        distribution::BalancerConfig,
        friction::DecayRates,
        generation::AttractionRates,
        survey::NonPositiveIncomePolicy,
        zone::ImputationPolicy,
        Predictor, TdmError, TripPurpose,
    },
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// defines behaviors for a trip generation and distribution run
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct TdmConfiguration {
    #[serde(default = "TdmConfiguration::default_purposes")]
    pub purposes: Vec<TripPurpose>,
    /// predictors of each purpose model. purposes without an entry use
    /// [`Predictor::DEFAULT`].
    #[serde(default)]
    pub predictors: HashMap<TripPurpose, Vec<Predictor>>,
    #[serde(default)]
    pub income_policy: NonPositiveIncomePolicy,
    #[serde(default)]
    pub imputation_policy: ImputationPolicy,
    #[serde(default)]
    pub attraction_rates: AttractionRates,
    #[serde(default)]
    pub decay_rates: DecayRates,
    #[serde(default)]
    pub solver: BalancerConfig,
    /// lower bound applied to zone productions before balancing
    #[serde(default)]
    pub production_floor: Option<f64>,
    #[serde(default = "TdmConfiguration::default_parallelize")]
    pub parallelize: bool,
    /// fail the run on a non-converged purpose instead of writing its last iterate
    #[serde(default)]
    pub require_convergence: bool,
    /// observed mean trip time in minutes per purpose, used for validation
    /// and decay rate calibration
    #[serde(default)]
    pub observed_average_times: HashMap<TripPurpose, f64>,
    /// replace configured decay rates with calibrated ones for purposes that
    /// have an observed average time
    #[serde(default)]
    pub calibrate_decay: bool,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Default for TdmConfiguration {
    fn default() -> Self {
        Self {
            purposes: TdmConfiguration::default_purposes(),
            predictors: HashMap::new(),
            income_policy: NonPositiveIncomePolicy::default(),
            imputation_policy: ImputationPolicy::default(),
            attraction_rates: AttractionRates::default(),
            decay_rates: DecayRates::default(),
            solver: BalancerConfig::default(),
            production_floor: None,
            parallelize: TdmConfiguration::default_parallelize(),
            require_convergence: false,
            observed_average_times: HashMap::new(),
            calibrate_decay: false,
            calibration: CalibrationConfig::default(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl TdmConfiguration {
    fn default_purposes() -> Vec<TripPurpose> {
        TripPurpose::ALL.to_vec()
    }

    fn default_parallelize() -> bool {
        true
    }

    pub fn get_predictors(&self, purpose: &TripPurpose) -> Vec<Predictor> {
        self.predictors
            .get(purpose)
            .cloned()
            .unwrap_or_else(|| Predictor::DEFAULT.to_vec())
    }

    pub fn get_observed_average_time(&self, purpose: &TripPurpose) -> Option<f64> {
        self.observed_average_times.get(purpose).copied()
    }

    /// rejects settings that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), TdmError> {
        if self.purposes.is_empty() {
            return Err(TdmError::ConfigurationError(String::from(
                "at least one trip purpose is required",
            )));
        }
        if self.purposes.iter().unique().count() != self.purposes.len() {
            return Err(TdmError::ConfigurationError(format!(
                "trip purposes [{}] contain duplicates",
                self.purposes.iter().join(", ")
            )));
        }
        self.solver.validate()?;
        self.attraction_rates.validate()?;
        for purpose in self.purposes.iter() {
            self.decay_rates.get_rate(purpose)?;
            self.attraction_rates.get_rates(purpose)?;
            if let Some(observed) = self.get_observed_average_time(purpose) {
                if !observed.is_finite() || observed <= 0.0 {
                    return Err(TdmError::ConfigurationError(format!(
                        "{purpose} observed average time must be positive, found {observed}"
                    )));
                }
            }
        }
        if let Some(floor) = self.production_floor {
            if !floor.is_finite() || floor < 0.0 {
                return Err(TdmError::ConfigurationError(format!(
                    "production floor must be a non-negative number, found {floor}"
                )));
            }
        }
        if self.calibrate_decay {
            self.calibration.validate()?;
        }
        Ok(())
    }
}

impl TryFrom<&String> for TdmConfiguration {
    type Error = TdmCliError;

    fn try_from(f: &String) -> Result<Self, Self::Error> {
        let conf: TdmConfiguration = if f.ends_with(".toml") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                TdmCliError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            toml::from_str(&s).map_err(|e| {
                TdmCliError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })?
        } else if f.ends_with(".json") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                TdmCliError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            serde_json::from_str(&s).map_err(|e| {
                TdmCliError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })?
        } else {
            return Err(TdmCliError::ConfigurationError(format!(
                "unsupported file type: {f}"
            )));
        };
        conf.validate()?;
        Ok(conf)
    }
}
