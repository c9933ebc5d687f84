use super::CalibrationConfig;
use crate::model::{
    aggregation::FlowAggregator,
    distribution::{BalancerConfig, GravityBalancer},
    friction::{FrictionFactorTable, TravelTimeMatrix},
    zone::ZoneTable,
    TdmError, TripPurpose,
};
use serde::{Deserialize, Serialize};

/// outcome of a decay rate calibration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalibrationResult {
    pub purpose: TripPurpose,
    pub decay_rate: f64,
    pub observed_average_time: f64,
    pub modeled_average_time: f64,
    /// number of gravity model solves, including the two bracket probes
    pub probes: usize,
}

/// finds the decay rate `m` whose gravity solution reproduces an observed
/// mean trip time. the modeled mean time decreases monotonically in `m`, so
/// the search is a bisection over the configured bracket, and every probe
/// re-solves the gravity model from scratch.
pub struct DecayCalibration<'a> {
    purpose: TripPurpose,
    productions: &'a [f64],
    attractions: &'a [f64],
    zones: &'a ZoneTable,
    travel_times: &'a TravelTimeMatrix,
    balancer: BalancerConfig,
    config: CalibrationConfig,
}

impl<'a> DecayCalibration<'a> {
    pub fn new(
        purpose: TripPurpose,
        productions: &'a [f64],
        attractions: &'a [f64],
        zones: &'a ZoneTable,
        travel_times: &'a TravelTimeMatrix,
        balancer: BalancerConfig,
        config: CalibrationConfig,
    ) -> DecayCalibration<'a> {
        DecayCalibration {
            purpose,
            productions,
            attractions,
            zones,
            travel_times,
            balancer,
            config,
        }
    }

    pub fn calibrate(&self, observed: f64) -> Result<CalibrationResult, TdmError> {
        self.config.validate()?;
        if !observed.is_finite() || observed <= 0.0 {
            return Err(TdmError::ConfigurationError(format!(
                "{} observed average trip time must be positive, found {observed}",
                self.purpose
            )));
        }
        let tol = self.config.tolerance;
        let mut lo = self.config.lower_bound;
        let mut hi = self.config.upper_bound;
        let longest = self.mean_time(lo)?;
        let shortest = self.mean_time(hi)?;
        let mut probes = 2;
        if observed > longest + tol || observed < shortest - tol {
            return Err(TdmError::ModelDegeneracy {
                purpose: self.purpose,
                reason: format!(
                    "observed average time {observed:.3} is outside of the achievable range \
                     [{shortest:.3}, {longest:.3}] for decay rates in [{lo}, {hi}]"
                ),
            });
        }
        if (longest - observed).abs() <= tol {
            return Ok(self.result(lo, observed, longest, probes));
        }
        if (shortest - observed).abs() <= tol {
            return Ok(self.result(hi, observed, shortest, probes));
        }

        let mut best = (lo, longest);
        for _ in 0..self.config.max_iterations {
            let mid = (lo + hi) / 2.0;
            let modeled = self.mean_time(mid)?;
            probes += 1;
            log::debug!(
                "{} decay rate {mid:.6} gives mean trip time {modeled:.4} (observed {observed:.4})",
                self.purpose
            );
            if (modeled - observed).abs() < (best.1 - observed).abs() {
                best = (mid, modeled);
            }
            if (modeled - observed).abs() <= tol {
                log::info!(
                    "{} calibrated decay rate {mid:.6} after {probes} probes",
                    self.purpose
                );
                return Ok(self.result(mid, observed, modeled, probes));
            }
            if modeled > observed {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        log::warn!(
            "{} calibration stopped at decay rate {:.6} with mean trip time {:.4}",
            self.purpose,
            best.0,
            best.1
        );
        Err(TdmError::ConvergenceFailure {
            purpose: self.purpose,
            iterations: probes,
            error: (best.1 - observed).abs(),
            tolerance: tol,
        })
    }

    /// flow-weighted mean trip time of the gravity solution at decay rate `m`.
    pub fn mean_time(&self, decay_rate: f64) -> Result<f64, TdmError> {
        let friction =
            FrictionFactorTable::with_decay_rate(self.purpose, self.travel_times, decay_rate)?;
        let balancer = GravityBalancer::new(
            self.purpose,
            self.productions.to_vec(),
            self.attractions.to_vec(),
            friction,
            self.balancer.clone(),
        )?;
        let solution = balancer.solve();
        if !solution.is_converged() {
            log::warn!(
                "{} gravity solution at decay rate {decay_rate} is not converged, using its last iterate",
                self.purpose
            );
        }
        FlowAggregator::new(self.zones, self.travel_times)
            .average_travel_time(&solution.flows)?
            .ok_or_else(|| TdmError::ModelDegeneracy {
                purpose: self.purpose,
                reason: String::from("gravity solution carries no flow, mean trip time is undefined"),
            })
    }

    fn result(&self, decay_rate: f64, observed: f64, modeled: f64, probes: usize) -> CalibrationResult {
        CalibrationResult {
            purpose: self.purpose,
            decay_rate,
            observed_average_time: observed,
            modeled_average_time: modeled,
            probes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::friction::TravelTimeRecord;
    use crate::model::zone::{ImputationPolicy, ZoneRecord};
    use itertools::Itertools;

    const IDS: [&str; 3] = ["a", "b", "c"];

    fn inputs() -> (ZoneTable, TravelTimeMatrix) {
        let records = IDS
            .iter()
            .map(|id| ZoneRecord::new(id, 10.0, 1.0, 1.0, 1.0))
            .collect();
        let zones = ZoneTable::new(records, ImputationPolicy::RegionMedian).unwrap();
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
        let matrix = TravelTimeMatrix::new(&records, &zones).unwrap();
        (zones, matrix)
    }

    #[test]
    fn test_recovers_decay_rate_of_observed_mean() {
        let (zones, matrix) = inputs();
        let productions = [120.0, 80.0, 40.0];
        let attractions = [60.0, 100.0, 80.0];
        let calibration = DecayCalibration::new(
            TripPurpose::Hbw,
            &productions,
            &attractions,
            &zones,
            &matrix,
            BalancerConfig::new(1e-8, 10_000),
            CalibrationConfig::default(),
        );
        let observed = calibration.mean_time(0.1).unwrap();
        let result = calibration.calibrate(observed).unwrap();
        assert!((result.modeled_average_time - observed).abs() <= 0.01);
        assert!((result.decay_rate - 0.1).abs() < 0.005);
        assert!(calibration.mean_time(0.05).unwrap() > calibration.mean_time(0.2).unwrap());
    }

    #[test]
    fn test_unreachable_mean_fails() {
        let (zones, matrix) = inputs();
        let productions = [120.0, 80.0, 40.0];
        let attractions = [60.0, 100.0, 80.0];
        let calibration = DecayCalibration::new(
            TripPurpose::Hbo,
            &productions,
            &attractions,
            &zones,
            &matrix,
            BalancerConfig::new(1e-8, 10_000),
            CalibrationConfig::default(),
        );
        // the longest achievable mean is the independence solution's
        assert!(matches!(
            calibration.calibrate(60.0),
            Err(TdmError::ModelDegeneracy { .. })
        ));
        assert!(matches!(
            calibration.calibrate(1.0),
            Err(TdmError::ModelDegeneracy { .. })
        ));
    }
}
