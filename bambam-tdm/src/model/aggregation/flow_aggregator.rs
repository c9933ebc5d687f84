use super::{
    AggregationConfig, FlowSummary, GroupMatrix, MarginalReportRow, TravelTimeValidation,
    TripLengthBin, ZoneGrouping,
};
use crate::model::{
    distribution::FlowMatrix, friction::TravelTimeMatrix, zone::ZoneTable, TdmError,
};
use itertools::Itertools;

/// upper limit on trip length histogram size.
pub const MAX_TRIP_LENGTH_BINS: usize = 1_000_000;

/// pure reductions over flow matrices of a shared zone table and skim.
pub struct FlowAggregator<'a> {
    zones: &'a ZoneTable,
    travel_times: &'a TravelTimeMatrix,
}

impl<'a> FlowAggregator<'a> {
    pub fn new(zones: &'a ZoneTable, travel_times: &'a TravelTimeMatrix) -> FlowAggregator<'a> {
        FlowAggregator {
            zones,
            travel_times,
        }
    }

    pub fn total_flow(&self, flows: &FlowMatrix) -> f64 {
        flows.total()
    }

    /// `Σ(flow · time) / Σ(flow)`, or None if the matrix carries no flow.
    pub fn average_travel_time(&self, flows: &FlowMatrix) -> Result<Option<f64>, TdmError> {
        let weighted = self.timed_flows(flows)?;
        let total: f64 = weighted.iter().map(|(flow, _)| flow).sum();
        if total <= 0.0 {
            return Ok(None);
        }
        let flow_time: f64 = weighted.iter().map(|(flow, time)| flow * time).sum();
        Ok(Some(flow_time / total))
    }

    pub fn group_matrix(
        &self,
        flows: &FlowMatrix,
        grouping: &ZoneGrouping,
    ) -> Result<GroupMatrix, TdmError> {
        GroupMatrix::new(flows, self.zones, grouping)
    }

    /// flow totals by travel time bin of width `bin_width` minutes, from zero
    /// through the longest trip carrying flow.
    pub fn trip_length_distribution(
        &self,
        flows: &FlowMatrix,
        bin_width: f64,
    ) -> Result<Vec<TripLengthBin>, TdmError> {
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(TdmError::ConfigurationError(format!(
                "trip length bin width must be positive, found {bin_width}"
            )));
        }
        let weighted = self
            .timed_flows(flows)?
            .into_iter()
            .filter(|(flow, _)| *flow > 0.0)
            .collect_vec();
        let max_bin = match weighted
            .iter()
            .map(|(_, time)| (time / bin_width).floor())
            .max_by(|a, b| a.total_cmp(b))
        {
            Some(max_bin) => max_bin,
            None => return Ok(vec![]),
        };
        if max_bin >= MAX_TRIP_LENGTH_BINS as f64 {
            return Err(TdmError::ConfigurationError(format!(
                "trip length bin width {bin_width} needs {} bins to cover the longest trip, more than the limit of {MAX_TRIP_LENGTH_BINS}",
                max_bin + 1.0
            )));
        }
        let n_bins = max_bin as usize + 1;
        let mut bin_flows = vec![0.0; n_bins];
        for (flow, time) in weighted.iter() {
            bin_flows[(time / bin_width).floor() as usize] += flow;
        }
        let total: f64 = bin_flows.iter().sum();
        let bins = bin_flows
            .into_iter()
            .enumerate()
            .map(|(idx, flow)| TripLengthBin {
                lower: idx as f64 * bin_width,
                upper: (idx + 1) as f64 * bin_width,
                flow,
                share: if total > 0.0 { Some(flow / total) } else { None },
            })
            .collect_vec();
        Ok(bins)
    }

    pub fn validate_travel_time(
        &self,
        flows: &FlowMatrix,
        observed: f64,
    ) -> Result<TravelTimeValidation, TdmError> {
        let modeled = self.average_travel_time(flows)?;
        Ok(TravelTimeValidation::new(modeled, observed))
    }

    /// modeled row and column sums of each zone alongside its targets.
    pub fn marginal_report(
        &self,
        flows: &FlowMatrix,
        productions: &[f64],
        attractions: &[f64],
    ) -> Vec<MarginalReportRow> {
        let rows = flows.row_sums();
        let cols = flows.column_sums();
        self.zones
            .zone_ids()
            .enumerate()
            .map(|(idx, zone_id)| MarginalReportRow {
                zone_id: zone_id.to_string(),
                target_production: productions.get(idx).copied().unwrap_or_default(),
                modeled_production: rows.get(idx).copied().unwrap_or_default(),
                target_attraction: attractions.get(idx).copied().unwrap_or_default(),
                modeled_attraction: cols.get(idx).copied().unwrap_or_default(),
            })
            .collect_vec()
    }

    /// every reduction the configuration asks for, for one purpose.
    pub fn summarize(
        &self,
        flows: &FlowMatrix,
        config: &AggregationConfig,
        observed_average_time: Option<f64>,
    ) -> Result<FlowSummary, TdmError> {
        let average_travel_time = self.average_travel_time(flows)?;
        let travel_time_validation =
            observed_average_time.map(|obs| TravelTimeValidation::new(average_travel_time, obs));
        let trip_length_distribution = match config.trip_length_bin_width {
            Some(width) => self.trip_length_distribution(flows, width)?,
            None => vec![],
        };
        let groups = match &config.grouping {
            Some(grouping) => Some(self.group_matrix(flows, grouping)?),
            None => None,
        };
        Ok(FlowSummary {
            purpose: flows.purpose,
            total_flow: self.total_flow(flows),
            average_travel_time,
            travel_time_validation,
            trip_length_distribution,
            groups,
        })
    }

    /// (flow, time) for each flow entry. a positive flow on a pair without a
    /// travel time cannot be weighted and is rejected.
    fn timed_flows(&self, flows: &FlowMatrix) -> Result<Vec<(f64, f64)>, TdmError> {
        flows
            .flows()
            .iter()
            .filter(|f| f.flow > 0.0)
            .map(|f| match self.travel_times.get(f.origin, f.destination) {
                Some(time) => Ok((f.flow, time)),
                None => Err(TdmError::InvalidTravelTimeData(format!(
                    "pair ({}, {}) carries flow but has no travel time",
                    f.origin, f.destination
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::distribution::{BalancerConfig, Flow, GravityBalancer};
    use crate::model::friction::{FrictionFactorTable, TravelTimeRecord};
    use crate::model::zone::{ImputationPolicy, ZoneRecord};
    use crate::model::TripPurpose;
    use std::collections::HashMap;

    const IDS: [&str; 3] = ["08031000100", "08031000200", "08005000100"];

    fn zones() -> ZoneTable {
        let records = IDS
            .iter()
            .map(|id| ZoneRecord::new(id, 10.0, 1.0, 1.0, 1.0))
            .collect();
        ZoneTable::new(records, ImputationPolicy::RegionMedian).unwrap()
    }

    fn travel_times(zones: &ZoneTable) -> TravelTimeMatrix {
        let times = [[3.0, 8.0, 22.0], [9.0, 4.0, 18.0], [21.0, 17.0, 5.0]];
        let records = IDS
            .iter()
            .enumerate()
            .flat_map(|(i, o)| {
                IDS.iter()
                    .enumerate()
                    .map(move |(j, d)| TravelTimeRecord::new(o, d, times[i][j]))
            })
            .collect_vec();
        TravelTimeMatrix::new(&records, zones).unwrap()
    }

    fn flows(entries: &[(usize, usize, f64)]) -> FlowMatrix {
        let entries = entries
            .iter()
            .map(|(o, d, flow)| Flow {
                origin: *o,
                destination: *d,
                flow: *flow,
            })
            .collect_vec();
        FlowMatrix::new(TripPurpose::Hbw, 3, entries)
    }

    #[test]
    fn test_single_group_total_equals_production() {
        let zones = zones();
        let times = travel_times(&zones);
        let productions = vec![120.0, 80.0, 40.0];
        let attractions = vec![60.0, 100.0, 80.0];
        let friction = FrictionFactorTable::with_decay_rate(TripPurpose::Hbw, &times, 0.08).unwrap();
        let solution = GravityBalancer::new(
            TripPurpose::Hbw,
            productions.clone(),
            attractions,
            friction,
            BalancerConfig::new(1e-8, 10_000),
        )
        .unwrap()
        .solve();
        assert!(solution.is_converged());
        let region = ZoneGrouping::Explicit {
            groups: IDS
                .iter()
                .map(|id| (id.to_string(), String::from("region")))
                .collect::<HashMap<_, _>>(),
        };
        let aggregator = FlowAggregator::new(&zones, &times);
        let matrix = aggregator.group_matrix(&solution.flows, &region).unwrap();
        assert_eq!(matrix.groups, vec![String::from("region")]);
        let expected: f64 = productions.iter().sum();
        assert!((matrix.total() - expected).abs() < 1e-6);
        assert!((matrix.get("region", "region").unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_county_grouping() {
        let zones = zones();
        let times = travel_times(&zones);
        let aggregator = FlowAggregator::new(&zones, &times);
        let f = flows(&[(0, 1, 10.0), (1, 0, 5.0), (0, 2, 2.0), (2, 2, 7.0)]);
        let matrix = aggregator.group_matrix(&f, &ZoneGrouping::county()).unwrap();
        assert_eq!(matrix.groups, vec![String::from("08005"), String::from("08031")]);
        assert_eq!(matrix.get("08031", "08031"), Some(15.0));
        assert_eq!(matrix.get("08031", "08005"), Some(2.0));
        assert_eq!(matrix.get("08005", "08005"), Some(7.0));
        assert_eq!(matrix.get("08005", "08031"), None);
    }

    #[test]
    fn test_average_travel_time() {
        let zones = zones();
        let times = travel_times(&zones);
        let aggregator = FlowAggregator::new(&zones, &times);
        // 10 trips at 8 minutes and 30 trips at 4 minutes
        let f = flows(&[(0, 1, 10.0), (1, 1, 30.0), (2, 0, 0.0)]);
        let avg = aggregator.average_travel_time(&f).unwrap().unwrap();
        assert!((avg - 5.0).abs() < 1e-12);
        let validation = aggregator.validate_travel_time(&f, 4.0).unwrap();
        assert_eq!(validation.absolute_difference, Some(1.0));
        assert_eq!(validation.relative_difference, Some(0.25));
    }

    #[test]
    fn test_zero_flow_average_is_undefined() {
        let zones = zones();
        let times = travel_times(&zones);
        let aggregator = FlowAggregator::new(&zones, &times);
        let f = flows(&[(0, 1, 0.0), (1, 0, 0.0)]);
        assert_eq!(aggregator.total_flow(&f), 0.0);
        assert_eq!(aggregator.average_travel_time(&f).unwrap(), None);
        let validation = aggregator.validate_travel_time(&f, 12.0).unwrap();
        assert_eq!(validation.modeled, None);
        assert_eq!(validation.relative_difference, None);
    }

    #[test]
    fn test_trip_length_distribution() {
        let zones = zones();
        let times = travel_times(&zones);
        let aggregator = FlowAggregator::new(&zones, &times);
        // times 3, 8 and 22 minutes
        let f = flows(&[(0, 0, 6.0), (0, 1, 2.0), (0, 2, 2.0)]);
        let bins = aggregator.trip_length_distribution(&f, 5.0).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].flow, 6.0);
        assert_eq!(bins[1].flow, 2.0);
        assert_eq!(bins[2].flow, 0.0);
        assert_eq!(bins[4].flow, 2.0);
        assert_eq!(bins[4].lower, 20.0);
        assert_eq!(bins[0].share, Some(0.6));
        assert!(aggregator.trip_length_distribution(&f, 0.0).is_err());
    }

    #[test]
    fn test_trip_length_bin_count_is_capped() {
        let zones = zones();
        let records = vec![
            TravelTimeRecord::new(IDS[0], IDS[1], 1e20),
            TravelTimeRecord::new(IDS[1], IDS[0], 5e6),
        ];
        let times = TravelTimeMatrix::new(&records, &zones).unwrap();
        let aggregator = FlowAggregator::new(&zones, &times);
        let far = flows(&[(0, 1, 1.0)]);
        assert_eq!(aggregator.average_travel_time(&far).unwrap(), Some(1e20));
        assert!(matches!(
            aggregator.trip_length_distribution(&far, 5.0),
            Err(TdmError::ConfigurationError(_))
        ));
        // 5e6 minutes in 5 minute bins is exactly the limit
        let edge = flows(&[(1, 0, 1.0)]);
        assert!(aggregator.trip_length_distribution(&edge, 5.0).is_err());
        let bins = aggregator.trip_length_distribution(&edge, 50.0).unwrap();
        assert_eq!(bins.len(), 100_001);
        assert_eq!(bins[100_000].flow, 1.0);
    }

    #[test]
    fn test_marginal_report() {
        let zones = zones();
        let times = travel_times(&zones);
        let aggregator = FlowAggregator::new(&zones, &times);
        let f = flows(&[(0, 1, 10.0), (1, 0, 5.0)]);
        let report = aggregator.marginal_report(&f, &[10.0, 6.0, 0.0], &[5.0, 10.0, 0.0]);
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].zone_id, IDS[0]);
        assert_eq!(report[1].modeled_production, 5.0);
        assert_eq!(report[1].target_production, 6.0);
        assert_eq!(report[1].modeled_attraction, 10.0);
    }
}
