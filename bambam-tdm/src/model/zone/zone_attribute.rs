use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// zone totals that can appear on the right-hand side of an attraction rate
/// formula.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ZoneAttribute {
    Households,
    EmploymentBasic,
    EmploymentRetail,
    EmploymentService,
    EmploymentTotal,
}

impl Display for ZoneAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ZoneAttribute::Households => "households",
            ZoneAttribute::EmploymentBasic => "employment_basic",
            ZoneAttribute::EmploymentRetail => "employment_retail",
            ZoneAttribute::EmploymentService => "employment_service",
            ZoneAttribute::EmploymentTotal => "employment_total",
        };
        write!(f, "{s}")
    }
}
