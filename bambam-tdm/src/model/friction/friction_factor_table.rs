use super::{DecayRates, TravelTimeMatrix};
use crate::model::{TdmError, TripPurpose};
use itertools::Itertools;

/// deterrence weight of a structurally present pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrictionFactor {
    pub origin: usize,
    pub destination: usize,
    pub factor: f64,
}

/// per-purpose friction factors `F = exp(-m * t)` over the pairs of a
/// [`TravelTimeMatrix`], in the same (origin, destination) order. pairs absent
/// from the matrix are absent here too; they are never given a zero factor.
#[derive(Clone, Debug)]
pub struct FrictionFactorTable {
    pub purpose: TripPurpose,
    /// None when the factors were supplied directly
    pub decay_rate: Option<f64>,
    n_zones: usize,
    factors: Vec<FrictionFactor>,
}

impl FrictionFactorTable {
    pub fn new(
        purpose: TripPurpose,
        travel_times: &TravelTimeMatrix,
        decay_rates: &DecayRates,
    ) -> Result<FrictionFactorTable, TdmError> {
        let decay_rate = decay_rates.get_rate(&purpose)?;
        FrictionFactorTable::with_decay_rate(purpose, travel_times, decay_rate)
    }

    pub fn with_decay_rate(
        purpose: TripPurpose,
        travel_times: &TravelTimeMatrix,
        decay_rate: f64,
    ) -> Result<FrictionFactorTable, TdmError> {
        DecayRates::validate_rate(&purpose, decay_rate)?;
        let factors = travel_times
            .pairs()
            .iter()
            .map(|p| FrictionFactor {
                origin: p.origin,
                destination: p.destination,
                factor: friction_factor(decay_rate, p.time),
            })
            .collect_vec();
        Ok(FrictionFactorTable {
            purpose,
            decay_rate: Some(decay_rate),
            n_zones: travel_times.n_zones(),
            factors,
        })
    }

    /// a table with explicit factors, e.g. from an externally calibrated
    /// friction curve. factors must be finite and non-negative, and each pair
    /// may appear once.
    pub fn from_factors(
        purpose: TripPurpose,
        n_zones: usize,
        factors: Vec<FrictionFactor>,
    ) -> Result<FrictionFactorTable, TdmError> {
        let factors = factors
            .into_iter()
            .sorted_by_key(|f| (f.origin, f.destination))
            .collect_vec();
        if let Some((a, _)) = factors
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.origin == b.origin && a.destination == b.destination)
        {
            return Err(TdmError::InvalidTravelTimeData(format!(
                "friction factor pair ({}, {}) appears more than once",
                a.origin, a.destination
            )));
        }
        for f in factors.iter() {
            if f.origin >= n_zones || f.destination >= n_zones {
                return Err(TdmError::InvalidTravelTimeData(format!(
                    "friction factor pair ({}, {}) is out of bounds for {n_zones} zones",
                    f.origin, f.destination
                )));
            }
            if !f.factor.is_finite() || f.factor < 0.0 {
                return Err(TdmError::InvalidTravelTimeData(format!(
                    "friction factor for pair ({}, {}) is invalid: {}",
                    f.origin, f.destination, f.factor
                )));
            }
        }
        Ok(FrictionFactorTable {
            purpose,
            decay_rate: None,
            n_zones,
            factors,
        })
    }

    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    pub fn factors(&self) -> &[FrictionFactor] {
        &self.factors
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// exponential deterrence of a travel time for decay rate `m`.
pub fn friction_factor(decay_rate: f64, time: f64) -> f64 {
    (-decay_rate * time).exp()
}
