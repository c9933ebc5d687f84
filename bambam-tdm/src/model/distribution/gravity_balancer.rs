use super::{
    gravity_ops, BalanceStatus, BalancerConfig, Flow, FlowMatrix, GapSide, GravitySolution,
    PairIndex, StructuralGap,
};
use crate::model::{friction::FrictionFactorTable, TdmError, TripPurpose};
use itertools::Itertools;
use std::collections::BTreeSet;

/// doubly-constrained gravity model of a single purpose, solved by iterative
/// proportional fitting (the Furness method) over the structurally present
/// pairs of its friction table.
///
/// the balancer owns its marginals and factor table, so purposes can be solved
/// independently and in parallel.
#[derive(Clone, Debug)]
pub struct GravityBalancer {
    pub purpose: TripPurpose,
    productions: Vec<f64>,
    attractions: Vec<f64>,
    friction: FrictionFactorTable,
    index: PairIndex,
    config: BalancerConfig,
}

impl GravityBalancer {
    /// validates that both marginal vectors match the zone count of the
    /// friction table and hold finite, non-negative values.
    pub fn new(
        purpose: TripPurpose,
        productions: Vec<f64>,
        attractions: Vec<f64>,
        friction: FrictionFactorTable,
        config: BalancerConfig,
    ) -> Result<GravityBalancer, TdmError> {
        config.validate()?;
        let n = friction.n_zones();
        validate_marginal(&purpose, "production", &productions, n)?;
        validate_marginal(&purpose, "attraction", &attractions, n)?;
        let index = PairIndex::new(&friction);
        Ok(GravityBalancer {
            purpose,
            productions,
            attractions,
            friction,
            index,
            config,
        })
    }

    pub fn n_zones(&self) -> usize {
        self.friction.n_zones()
    }

    /// runs the balancing loop. the returned solution always carries the last
    /// iterate; non-convergence and structural gaps are reported on it rather
    /// than raised.
    pub fn solve(&self) -> GravitySolution {
        let n = self.n_zones();
        let o = &self.productions;
        let d = &self.attractions;
        let mut b = vec![1.0; n];
        let mut gap_origins: BTreeSet<usize> = BTreeSet::new();
        let mut gap_destinations: BTreeSet<usize> = BTreeSet::new();
        let mut flows: Vec<f64> = vec![0.0; self.friction.len()];
        let mut error = f64::INFINITY;
        let mut iterations = 0;
        let mut status = BalanceStatus::ExhaustedIterations;

        for iteration in 1..=self.config.max_iterations {
            let a_pass = gravity_ops::destination_pass(&self.index, &b, o, d);
            gap_origins.extend(a_pass.unconstrainable.iter().copied());
            let b_pass = gravity_ops::origin_pass(&self.index, &a_pass.factors, o, d);
            gap_destinations.extend(b_pass.unconstrainable.iter().copied());
            b = b_pass.factors;

            flows =
                gravity_ops::compute_flows(self.friction.factors(), &a_pass.factors, &b, o, d);
            let (row_sums, col_sums) = gravity_ops::marginal_sums(self.friction.factors(), &flows, n);
            error = gravity_ops::convergence_error(
                &row_sums,
                &col_sums,
                o,
                d,
                &gap_origins,
                &gap_destinations,
            );
            iterations = iteration;
            log::debug!(
                "{} iteration {} relative error {:.6}",
                self.purpose,
                iteration,
                error
            );
            if error < self.config.tolerance {
                status = BalanceStatus::Converged;
                break;
            }
        }

        let structural_gaps = gap_origins
            .iter()
            .map(|&zone| StructuralGap {
                zone,
                side: GapSide::Origin,
                target: o[zone],
            })
            .chain(gap_destinations.iter().map(|&zone| StructuralGap {
                zone,
                side: GapSide::Destination,
                target: d[zone],
            }))
            .collect_vec();

        match status {
            BalanceStatus::Converged => log::info!(
                "{} converged after {} iterations with relative error {:.6}",
                self.purpose,
                iterations,
                error
            ),
            BalanceStatus::ExhaustedIterations => log::warn!(
                "{} did not converge within {} iterations, relative error {:.6} exceeds tolerance {}",
                self.purpose,
                iterations,
                error,
                self.config.tolerance
            ),
        }
        if !structural_gaps.is_empty() {
            log::warn!(
                "{} has {} zones with trips that no present pair can carry",
                self.purpose,
                structural_gaps.len()
            );
        }

        let flow_entries = self
            .friction
            .factors()
            .iter()
            .zip(flows)
            .map(|(f, flow)| Flow {
                origin: f.origin,
                destination: f.destination,
                flow,
            })
            .collect_vec();

        GravitySolution {
            purpose: self.purpose,
            flows: FlowMatrix::new(self.purpose, n, flow_entries),
            status,
            error,
            tolerance: self.config.tolerance,
            iterations,
            structural_gaps,
        }
    }
}

fn validate_marginal(
    purpose: &TripPurpose,
    name: &str,
    values: &[f64],
    n_zones: usize,
) -> Result<(), TdmError> {
    if values.len() != n_zones {
        return Err(TdmError::InvalidZoneData(format!(
            "{purpose} has {} {name} values but the friction table has {n_zones} zones",
            values.len()
        )));
    }
    if let Some((idx, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(TdmError::InvalidZoneData(format!(
            "{purpose} {name} of zone #{idx} must be finite and non-negative, found {v}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::friction::{FrictionFactor, TravelTimeMatrix, TravelTimePair};
    use crate::model::zone::{ImputationPolicy, ZoneRecord, ZoneTable};

    fn full_friction(times: &[[f64; 3]; 3], decay_rate: f64) -> FrictionFactorTable {
        let pairs = (0..3)
            .flat_map(|i| {
                (0..3).map(move |j| TravelTimePair {
                    origin: i,
                    destination: j,
                    time: times[i][j],
                })
            })
            .collect_vec();
        let matrix = TravelTimeMatrix::from_pairs(3, pairs).unwrap();
        FrictionFactorTable::with_decay_rate(TripPurpose::Hbw, &matrix, decay_rate).unwrap()
    }

    fn zones() -> ZoneTable {
        let records = ["z0", "z1", "z2"]
            .iter()
            .map(|id| ZoneRecord::new(id, 10.0, 1.0, 1.0, 1.0))
            .collect();
        ZoneTable::new(records, ImputationPolicy::RegionMedian).unwrap()
    }

    /// zone 2 has no pairs at all
    fn island_friction() -> FrictionFactorTable {
        let factors = (0..2)
            .flat_map(|i| {
                (0..2).map(move |j| FrictionFactor {
                    origin: i,
                    destination: j,
                    factor: 1.0,
                })
            })
            .collect_vec();
        FrictionFactorTable::from_factors(TripPurpose::Hbw, 3, factors).unwrap()
    }

    #[test]
    fn test_uniform_friction_yields_independence_solution() {
        let friction = full_friction(&[[5.0; 3]; 3], 0.0);
        let balancer = GravityBalancer::new(
            TripPurpose::Hbw,
            vec![100.0, 50.0, 0.0],
            vec![60.0, 90.0, 0.0],
            friction,
            BalancerConfig::default(),
        )
        .unwrap();
        let solution = balancer.solve();
        assert!(solution.is_converged());
        let expected = [[40.0, 60.0, 0.0], [20.0, 30.0, 0.0], [0.0, 0.0, 0.0]];
        for (i, row) in expected.iter().enumerate() {
            for (j, e) in row.iter().enumerate() {
                let t = solution.flows.get(i, j).unwrap();
                assert!((t - e).abs() < 1e-9, "T[{i}][{j}] expected {e}, found {t}");
            }
        }
    }

    #[test]
    fn test_flows_conserve_marginals_when_converged() {
        let times = [[2.0, 10.0, 25.0], [12.0, 3.0, 15.0], [30.0, 14.0, 4.0]];
        let o = vec![100.0, 200.0, 50.0];
        let d = vec![150.0, 120.0, 80.0];
        let config = BalancerConfig::new(1e-8, 10_000);
        let balancer =
            GravityBalancer::new(TripPurpose::Hbw, o.clone(), d.clone(), full_friction(&times, 0.1), config)
                .unwrap();
        let solution = balancer.solve();
        assert!(solution.is_converged());
        assert!(solution.error < 1e-8);
        for (sum, target) in solution.flows.row_sums().iter().zip(o.iter()) {
            assert!((sum - target).abs() / target < 1e-6);
        }
        for (sum, target) in solution.flows.column_sums().iter().zip(d.iter()) {
            assert!((sum - target).abs() / target < 1e-6);
        }
        // nearer destinations get more trips than under independence
        let independent = 100.0 * 150.0 / 350.0;
        assert!(solution.flows.get(0, 0).unwrap() > independent);
    }

    #[test]
    fn test_zero_production_gives_zero_row() {
        let times = [[2.0, 10.0, 25.0], [12.0, 3.0, 15.0], [30.0, 14.0, 4.0]];
        let balancer = GravityBalancer::new(
            TripPurpose::Hbo,
            vec![0.0, 100.0, 50.0],
            vec![50.0, 50.0, 50.0],
            full_friction(&times, 0.12),
            BalancerConfig::default(),
        )
        .unwrap();
        let solution = balancer.solve();
        assert!(solution.structural_gaps.is_empty());
        for j in 0..3 {
            assert_eq!(solution.flows.get(0, j), Some(0.0));
        }
        assert!(solution.flows.flows().iter().all(|f| f.flow.is_finite()));
    }

    #[test]
    fn test_disconnected_zone_reports_structural_gap() {
        let balancer = GravityBalancer::new(
            TripPurpose::Hbw,
            vec![50.0, 50.0, 20.0],
            vec![50.0, 50.0, 0.0],
            island_friction(),
            BalancerConfig::default(),
        )
        .unwrap();
        let solution = balancer.solve();
        // the remaining zones balance, but the result is still not trusted
        assert_eq!(solution.status, BalanceStatus::Converged);
        assert!(!solution.is_converged());
        assert_eq!(
            solution.structural_gaps,
            vec![StructuralGap {
                zone: 2,
                side: GapSide::Origin,
                target: 20.0
            }]
        );
        assert!(solution.flows.get(2, 0).is_none());
        let zones = zones();
        let report = solution.report(&zones);
        assert_eq!(report.structural_gaps[0].zone_id, "z2");
        match solution.into_converged(&zones) {
            Err(TdmError::StructuralGap { zones, .. }) => assert!(zones[0].starts_with("z2")),
            other => panic!("expected structural gap, found {other:?}"),
        }
    }

    #[test]
    fn test_disconnected_attraction_flags_destination() {
        let balancer = GravityBalancer::new(
            TripPurpose::Nhb,
            vec![50.0, 50.0, 20.0],
            vec![40.0, 40.0, 40.0],
            island_friction(),
            BalancerConfig::new(0.01, 25),
        )
        .unwrap();
        let solution = balancer.solve();
        let sides = solution.structural_gaps.iter().map(|g| g.side).collect_vec();
        assert_eq!(sides, vec![GapSide::Origin, GapSide::Destination]);
        assert!(solution.flows.flows().iter().all(|f| f.flow.is_finite()));
    }

    #[test]
    fn test_iteration_cap_reports_best_iterate() {
        let times = [[2.0, 10.0, 25.0], [12.0, 3.0, 15.0], [30.0, 14.0, 4.0]];
        let balancer = GravityBalancer::new(
            TripPurpose::Hbw,
            vec![100.0, 200.0, 50.0],
            vec![150.0, 120.0, 80.0],
            full_friction(&times, 0.1),
            BalancerConfig::new(1e-12, 1),
        )
        .unwrap();
        let solution = balancer.solve();
        assert_eq!(solution.status, BalanceStatus::ExhaustedIterations);
        assert_eq!(solution.iterations, 1);
        assert!(solution.error > 1e-12);
        // the origin pass runs last, so columns already match
        for (sum, target) in solution.flows.column_sums().iter().zip([150.0, 120.0, 80.0]) {
            assert!((sum - target).abs() < 1e-9);
        }
        assert!(matches!(
            solution.into_converged(&zones()),
            Err(TdmError::ConvergenceFailure { iterations: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_marginals_rejected() {
        let friction = full_friction(&[[1.0; 3]; 3], 0.1);
        let negative = GravityBalancer::new(
            TripPurpose::Hbw,
            vec![1.0, -1.0, 0.0],
            vec![0.0, 0.0, 0.0],
            friction.clone(),
            BalancerConfig::default(),
        );
        assert!(matches!(negative, Err(TdmError::InvalidZoneData(_))));
        let short = GravityBalancer::new(
            TripPurpose::Hbw,
            vec![1.0, 1.0],
            vec![1.0, 1.0, 0.0],
            friction,
            BalancerConfig::default(),
        );
        assert!(short.is_err());
    }
}
