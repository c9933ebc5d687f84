use super::ZoneGrouping;
use serde::{Deserialize, Serialize};

/// optional reductions reported alongside totals and mean trip times.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AggregationConfig {
    /// when present, flows are also reported as a group x group matrix
    #[serde(default)]
    pub grouping: Option<ZoneGrouping>,
    /// when present, a trip length frequency distribution with bins of this
    /// width in minutes is reported
    #[serde(default)]
    pub trip_length_bin_width: Option<f64>,
}
