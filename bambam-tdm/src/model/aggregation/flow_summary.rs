use super::GroupMatrix;
use crate::model::TripPurpose;
use serde::{Deserialize, Serialize};

/// reductions of one purpose's flow matrix.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlowSummary {
    pub purpose: TripPurpose,
    pub total_flow: f64,
    /// flow-weighted mean travel time in minutes, None when there is no flow
    pub average_travel_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub travel_time_validation: Option<TravelTimeValidation>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trip_length_distribution: Vec<TripLengthBin>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub groups: Option<GroupMatrix>,
}

/// modeled vs observed mean trip time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TravelTimeValidation {
    pub observed: f64,
    pub modeled: Option<f64>,
    pub absolute_difference: Option<f64>,
    pub relative_difference: Option<f64>,
}

impl TravelTimeValidation {
    pub fn new(modeled: Option<f64>, observed: f64) -> TravelTimeValidation {
        let absolute_difference = modeled.map(|m| m - observed);
        let relative_difference = absolute_difference
            .filter(|_| observed != 0.0)
            .map(|diff| diff / observed);
        TravelTimeValidation {
            observed,
            modeled,
            absolute_difference,
            relative_difference,
        }
    }
}

/// flow carried by pairs with travel time in `[lower, upper)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TripLengthBin {
    pub lower: f64,
    pub upper: f64,
    pub flow: f64,
    pub share: Option<f64>,
}

/// per-zone modeled trip ends against their targets.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MarginalReportRow {
    pub zone_id: String,
    pub target_production: f64,
    pub modeled_production: f64,
    pub target_attraction: f64,
    pub modeled_attraction: f64,
}
