use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::TdmError;

/// the trip purposes of a three-purpose trip generation model. every stage of
/// the pipeline runs once per purpose with its own parameters and marginals.
#[derive(
    Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum TripPurpose {
    /// home-based work
    Hbw,
    /// home-based other
    Hbo,
    /// non-home-based
    Nhb,
}

impl TripPurpose {
    pub const ALL: [TripPurpose; 3] = [TripPurpose::Hbw, TripPurpose::Hbo, TripPurpose::Nhb];
}

impl Display for TripPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripPurpose::Hbw => write!(f, "hbw"),
            TripPurpose::Hbo => write!(f, "hbo"),
            TripPurpose::Nhb => write!(f, "nhb"),
        }
    }
}

impl FromStr for TripPurpose {
    type Err = TdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hbw" => Ok(TripPurpose::Hbw),
            "hbo" => Ok(TripPurpose::Hbo),
            "nhb" => Ok(TripPurpose::Nhb),
            other => Err(TdmError::ConfigurationError(format!(
                "unknown trip purpose '{other}', expected one of hbw, hbo, nhb"
            ))),
        }
    }
}
