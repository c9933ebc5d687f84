use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// how to treat a zone predictor that is missing from the zone table.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImputationPolicy {
    /// substitute the region-wide median of the zones where the value is present
    #[default]
    RegionMedian,
    /// treat any missing predictor as a data error
    Fail,
}

impl Display for ImputationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImputationPolicy::RegionMedian => write!(f, "region_median"),
            ImputationPolicy::Fail => write!(f, "fail"),
        }
    }
}
