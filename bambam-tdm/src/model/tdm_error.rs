use super::TripPurpose;
use itertools::Itertools;

#[derive(thiserror::Error, Debug)]
pub enum TdmError {
    #[error("invalid zone data: {0}")]
    InvalidZoneData(String),
    #[error("invalid survey data: {0}")]
    InvalidSurveyData(String),
    #[error("invalid travel time data: {0}")]
    InvalidTravelTimeData(String),
    #[error("zone '{0}' referenced by {1} is not present in the zone table")]
    UnknownZone(String, String),
    #[error("{purpose} model requires at least {parameters} usable survey records but found {observations}")]
    InsufficientObservations {
        purpose: TripPurpose,
        observations: usize,
        parameters: usize,
    },
    #[error("{purpose} model is degenerate: {reason}")]
    ModelDegeneracy {
        purpose: TripPurpose,
        reason: String,
    },
    #[error("{purpose} did not converge after {iterations} iterations (error {error:.6} >= tolerance {tolerance})")]
    ConvergenceFailure {
        purpose: TripPurpose,
        iterations: usize,
        error: f64,
        tolerance: f64,
    },
    #[error("{purpose} gravity model has unconstrainable zones: {}", zones.iter().join(", "))]
    StructuralGap {
        purpose: TripPurpose,
        zones: Vec<String>,
    },
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    InternalError(String),
}

impl TdmError {
    /// true for the missing/invalid input family of errors. these are fatal
    /// for the affected purpose.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TdmError::InvalidZoneData(_)
                | TdmError::InvalidSurveyData(_)
                | TdmError::InvalidTravelTimeData(_)
                | TdmError::UnknownZone(_, _)
                | TdmError::InsufficientObservations { .. }
        )
    }

    /// true for errors that end the affected purpose but leave the other
    /// purposes of a run usable.
    pub fn is_purpose_fatal(&self) -> bool {
        self.is_data_error() || matches!(self, TdmError::ModelDegeneracy { .. })
    }

    /// true for solver outcomes that still carry a usable best-effort result.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TdmError::ConvergenceFailure { .. } | TdmError::StructuralGap { .. }
        )
    }
}
