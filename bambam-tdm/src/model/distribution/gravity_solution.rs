use super::FlowMatrix;
use crate::model::{zone::ZoneTable, TdmError, TripPurpose};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// how the balancing loop terminated.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Converged,
    ExhaustedIterations,
}

impl Display for BalanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceStatus::Converged => write!(f, "converged"),
            BalanceStatus::ExhaustedIterations => write!(f, "exhausted-iterations"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GapSide {
    /// the zone has trips to produce but no reachable destination with attractions
    Origin,
    /// the zone has trips to attract but no reachable origin with productions
    Destination,
}

impl Display for GapSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapSide::Origin => write!(f, "origin"),
            GapSide::Destination => write!(f, "destination"),
        }
    }
}

/// a zone with a positive target whose flows were forced to zero because no
/// structurally present pair can carry them. distinguishes missing network
/// data from legitimately zero demand.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct StructuralGap {
    pub zone: usize,
    pub side: GapSide,
    /// the production or attraction that could not be placed
    pub target: f64,
}

impl StructuralGap {
    pub fn describe(&self, zones: &ZoneTable) -> String {
        let id = zones
            .zone_id(self.zone)
            .map(|z| z.to_string())
            .unwrap_or_else(|| format!("#{}", self.zone));
        format!("{id} ({} target {:.3})", self.side, self.target)
    }
}

/// the result of a gravity model solve. the flow matrix is always the last
/// iterate; whether it can be trusted is reported by [`Self::is_converged`].
#[derive(Clone, Debug)]
pub struct GravitySolution {
    pub purpose: TripPurpose,
    pub flows: FlowMatrix,
    pub status: BalanceStatus,
    /// maximum relative marginal deviation of the last iterate
    pub error: f64,
    pub tolerance: f64,
    pub iterations: usize,
    pub structural_gaps: Vec<StructuralGap>,
}

impl GravitySolution {
    /// true only if the loop met its tolerance and every zone could be
    /// constrained.
    pub fn is_converged(&self) -> bool {
        self.status == BalanceStatus::Converged && self.structural_gaps.is_empty()
    }

    /// the flow matrix if the solve converged without structural gaps.
    /// otherwise the corresponding recoverable error; callers that accept a
    /// best-effort result read [`Self::flows`] directly instead.
    pub fn into_converged(self, zones: &ZoneTable) -> Result<FlowMatrix, TdmError> {
        self.ensure_converged(zones)?;
        Ok(self.flows)
    }

    /// a structural gap error if any zone was unconstrainable, else a
    /// convergence failure if the tolerance was not met.
    pub fn ensure_converged(&self, zones: &ZoneTable) -> Result<(), TdmError> {
        if !self.structural_gaps.is_empty() {
            return Err(TdmError::StructuralGap {
                purpose: self.purpose,
                zones: self
                    .structural_gaps
                    .iter()
                    .map(|g| g.describe(zones))
                    .collect_vec(),
            });
        }
        match self.status {
            BalanceStatus::Converged => Ok(()),
            BalanceStatus::ExhaustedIterations => Err(TdmError::ConvergenceFailure {
                purpose: self.purpose,
                iterations: self.iterations,
                error: self.error,
                tolerance: self.tolerance,
            }),
        }
    }

    pub fn report(&self, zones: &ZoneTable) -> ConvergenceReport {
        ConvergenceReport {
            purpose: self.purpose,
            status: self.status,
            converged: self.is_converged(),
            error: self.error,
            tolerance: self.tolerance,
            iterations: self.iterations,
            structural_gaps: self
                .structural_gaps
                .iter()
                .map(|g| StructuralGapReport {
                    zone_id: zones
                        .zone_id(g.zone)
                        .map(|z| z.to_string())
                        .unwrap_or_else(|| g.zone.to_string()),
                    side: g.side,
                    target: g.target,
                })
                .collect_vec(),
        }
    }
}

/// serializable convergence status of one purpose.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConvergenceReport {
    pub purpose: TripPurpose,
    pub status: BalanceStatus,
    pub converged: bool,
    pub error: f64,
    pub tolerance: f64,
    pub iterations: usize,
    pub structural_gaps: Vec<StructuralGapReport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StructuralGapReport {
    pub zone_id: String,
    pub side: GapSide,
    pub target: f64,
}
