use crate::model::{zone::ZoneTable, TripPurpose};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// modeled trips of a structurally present pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flow {
    pub origin: usize,
    pub destination: usize,
    pub flow: f64,
}

/// a row of a per-purpose flow output file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlowRow {
    pub origin: String,
    pub destination: String,
    pub flow: f64,
}

/// the sparse zone-to-zone flow matrix of one purpose, sorted by
/// (origin, destination). only structurally present pairs have an entry.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowMatrix {
    pub purpose: TripPurpose,
    n_zones: usize,
    flows: Vec<Flow>,
}

impl FlowMatrix {
    pub fn new(purpose: TripPurpose, n_zones: usize, flows: Vec<Flow>) -> FlowMatrix {
        let flows = flows
            .into_iter()
            .sorted_by_key(|f| (f.origin, f.destination))
            .collect_vec();
        FlowMatrix {
            purpose,
            n_zones,
            flows,
        }
    }

    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// flow of a pair. zero for a present pair without trips, None for a pair
    /// that is structurally absent.
    pub fn get(&self, origin: usize, destination: usize) -> Option<f64> {
        self.flows
            .binary_search_by_key(&(origin, destination), |f| (f.origin, f.destination))
            .ok()
            .map(|idx| self.flows[idx].flow)
    }

    pub fn total(&self) -> f64 {
        self.flows.iter().map(|f| f.flow).sum()
    }

    /// trips leaving each zone
    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_zones];
        for f in self.flows.iter() {
            sums[f.origin] += f.flow;
        }
        sums
    }

    /// trips arriving at each zone
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_zones];
        for f in self.flows.iter() {
            sums[f.destination] += f.flow;
        }
        sums
    }

    /// output rows labeled with zone identifiers.
    pub fn rows(&self, zones: &ZoneTable) -> Vec<FlowRow> {
        let label = |idx: usize| {
            zones
                .zone_id(idx)
                .map(|z| z.to_string())
                .unwrap_or_else(|| idx.to_string())
        };
        self.flows
            .iter()
            .map(|f| FlowRow {
                origin: label(f.origin),
                destination: label(f.destination),
                flow: f.flow,
            })
            .collect_vec()
    }
}
