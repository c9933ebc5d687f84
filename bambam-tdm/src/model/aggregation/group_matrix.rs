use super::ZoneGrouping;
use crate::model::{distribution::FlowMatrix, zone::ZoneTable, TdmError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupFlow {
    pub origin_group: String,
    pub destination_group: String,
    pub flow: f64,
}

/// a group x group flow matrix, with cells only for group pairs that carry
/// at least one structurally present zone pair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupMatrix {
    pub groups: Vec<String>,
    pub cells: Vec<GroupFlow>,
}

impl GroupMatrix {
    pub fn new(
        flows: &FlowMatrix,
        zones: &ZoneTable,
        grouping: &ZoneGrouping,
    ) -> Result<GroupMatrix, TdmError> {
        let zone_groups = zones
            .zone_ids()
            .map(|z| grouping.group_of(z))
            .collect::<Result<Vec<_>, TdmError>>()?;
        let mut sums: BTreeMap<(&str, &str), f64> = BTreeMap::new();
        for f in flows.flows().iter() {
            let (o, d) = match (zone_groups.get(f.origin), zone_groups.get(f.destination)) {
                (Some(o), Some(d)) => (o.as_str(), d.as_str()),
                _ => {
                    return Err(TdmError::InternalError(format!(
                        "flow pair ({}, {}) is outside of the zone table",
                        f.origin, f.destination
                    )))
                }
            };
            *sums.entry((o, d)).or_insert(0.0) += f.flow;
        }
        let groups = zone_groups.iter().cloned().unique().sorted().collect_vec();
        let cells = sums
            .into_iter()
            .map(|((o, d), flow)| GroupFlow {
                origin_group: o.to_string(),
                destination_group: d.to_string(),
                flow,
            })
            .collect_vec();
        Ok(GroupMatrix { groups, cells })
    }

    pub fn get(&self, origin_group: &str, destination_group: &str) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.origin_group == origin_group && c.destination_group == destination_group)
            .map(|c| c.flow)
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().map(|c| c.flow).sum()
    }
}
