use crate::model::{
    zone::{ZoneId, ZoneTable},
    TdmError,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// a (origin, destination, time) triple of a network skim, in minutes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TravelTimeRecord {
    pub origin: ZoneId,
    pub destination: ZoneId,
    pub time: f64,
}

impl TravelTimeRecord {
    pub fn new(origin: &str, destination: &str, time: f64) -> TravelTimeRecord {
        TravelTimeRecord {
            origin: ZoneId::new(origin),
            destination: ZoneId::new(destination),
            time,
        }
    }
}

/// a structurally present zone pair addressed by zone table index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TravelTimePair {
    pub origin: usize,
    pub destination: usize,
    pub time: f64,
}

/// the sparse travel time matrix. only pairs with a skim entry exist;
/// unreachable pairs are absent rather than stored with a sentinel time.
/// pairs are sorted by (origin, destination).
#[derive(Clone, Debug)]
pub struct TravelTimeMatrix {
    n_zones: usize,
    pairs: Vec<TravelTimePair>,
}

impl TravelTimeMatrix {
    /// resolves skim records against the zone table, rejecting unknown zones,
    /// duplicate pairs, and times that are negative or not finite.
    pub fn new(
        records: &[TravelTimeRecord],
        zones: &ZoneTable,
    ) -> Result<TravelTimeMatrix, TdmError> {
        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(records.len());
        let pairs = records
            .iter()
            .map(|r| {
                let origin = zones.index_of(&r.origin).ok_or_else(|| {
                    TdmError::UnknownZone(r.origin.to_string(), String::from("travel time origin"))
                })?;
                let destination = zones.index_of(&r.destination).ok_or_else(|| {
                    TdmError::UnknownZone(
                        r.destination.to_string(),
                        String::from("travel time destination"),
                    )
                })?;
                if !r.time.is_finite() || r.time < 0.0 {
                    return Err(TdmError::InvalidTravelTimeData(format!(
                        "pair ({}, {}) has invalid time {}",
                        r.origin, r.destination, r.time
                    )));
                }
                if !seen.insert((origin, destination)) {
                    return Err(TdmError::InvalidTravelTimeData(format!(
                        "pair ({}, {}) appears more than once",
                        r.origin, r.destination
                    )));
                }
                Ok(TravelTimePair {
                    origin,
                    destination,
                    time: r.time,
                })
            })
            .collect::<Result<Vec<_>, TdmError>>()?;
        TravelTimeMatrix::from_pairs(zones.len(), pairs)
    }

    /// builds a matrix directly from index pairs.
    pub fn from_pairs(
        n_zones: usize,
        pairs: Vec<TravelTimePair>,
    ) -> Result<TravelTimeMatrix, TdmError> {
        let sorted = pairs
            .into_iter()
            .sorted_by_key(|p| (p.origin, p.destination))
            .collect_vec();
        for pair in sorted.iter() {
            if pair.origin >= n_zones || pair.destination >= n_zones {
                return Err(TdmError::InvalidTravelTimeData(format!(
                    "pair ({}, {}) is out of bounds for {n_zones} zones",
                    pair.origin, pair.destination
                )));
            }
            if !pair.time.is_finite() || pair.time < 0.0 {
                return Err(TdmError::InvalidTravelTimeData(format!(
                    "pair ({}, {}) has invalid time {}",
                    pair.origin, pair.destination, pair.time
                )));
            }
        }
        if let Some((a, _)) = sorted
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.origin == b.origin && a.destination == b.destination)
        {
            return Err(TdmError::InvalidTravelTimeData(format!(
                "pair ({}, {}) appears more than once",
                a.origin, a.destination
            )));
        }
        Ok(TravelTimeMatrix {
            n_zones,
            pairs: sorted,
        })
    }

    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    pub fn pairs(&self) -> &[TravelTimePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// the travel time of a present pair, or None for a structurally absent pair.
    pub fn get(&self, origin: usize, destination: usize) -> Option<f64> {
        self.pairs
            .binary_search_by_key(&(origin, destination), |p| (p.origin, p.destination))
            .ok()
            .map(|idx| self.pairs[idx].time)
    }
}
