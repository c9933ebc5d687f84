use super::{AttractionRates, TripPurposeModel};
use crate::model::{zone::ZoneTable, TdmError, TripPurpose};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// trip ends of one purpose for every zone, in zone table order.
#[derive(Clone, Debug, PartialEq)]
pub struct PurposeTripEnds {
    pub purpose: TripPurpose,
    pub productions: Vec<f64>,
    pub raw_attractions: Vec<f64>,
    pub balanced_attractions: Vec<f64>,
    /// the single multiplicative factor that balances attractions to productions
    pub scale: f64,
}

impl PurposeTripEnds {
    pub fn total_production(&self) -> f64 {
        self.productions.iter().sum()
    }

    pub fn total_balanced_attraction(&self) -> f64 {
        self.balanced_attractions.iter().sum()
    }
}

/// a row of the production/attraction output table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProductionAttractionRow {
    pub zone_id: String,
    pub purpose: TripPurpose,
    pub production: f64,
    pub raw_attraction: f64,
    pub balanced_attraction: f64,
}

/// trip ends for every computed purpose.
#[derive(Clone, Debug, Default)]
pub struct ProductionAttractionTable(pub BTreeMap<TripPurpose, PurposeTripEnds>);

impl ProductionAttractionTable {
    pub fn get(&self, purpose: &TripPurpose) -> Option<&PurposeTripEnds> {
        self.0.get(purpose)
    }

    /// flattens the table into output rows, ordered by purpose then zone.
    pub fn rows(&self, zones: &ZoneTable) -> Vec<ProductionAttractionRow> {
        self.0
            .values()
            .flat_map(move |ends| {
                zones.zone_ids().enumerate().map(move |(idx, zone_id)| {
                    ProductionAttractionRow {
                        zone_id: zone_id.to_string(),
                        purpose: ends.purpose,
                        production: ends.productions[idx],
                        raw_attraction: ends.raw_attractions[idx],
                        balanced_attraction: ends.balanced_attractions[idx],
                    }
                })
            })
            .collect_vec()
    }
}

/// applies trip purpose models and attraction rates to a zone table and
/// balances the attractions of each purpose to its productions.
pub struct ProductionAttractionEngine<'a> {
    models: &'a BTreeMap<TripPurpose, TripPurposeModel>,
    zones: &'a ZoneTable,
    attraction_rates: &'a AttractionRates,
    production_floor: Option<f64>,
}

impl<'a> ProductionAttractionEngine<'a> {
    pub fn new(
        models: &'a BTreeMap<TripPurpose, TripPurposeModel>,
        zones: &'a ZoneTable,
        attraction_rates: &'a AttractionRates,
        production_floor: Option<f64>,
    ) -> ProductionAttractionEngine<'a> {
        ProductionAttractionEngine {
            models,
            zones,
            attraction_rates,
            production_floor,
        }
    }

    /// computes productions, raw attractions, and balanced attractions for one
    /// purpose. balancing uses a single scale factor so that the sum of
    /// balanced attractions equals the sum of productions.
    pub fn compute_purpose(&self, purpose: &TripPurpose) -> Result<PurposeTripEnds, TdmError> {
        let model = self.models.get(purpose).ok_or_else(|| {
            TdmError::ConfigurationError(format!("no trip purpose model for {purpose}"))
        })?;

        let mut productions = (0..self.zones.len())
            .map(|idx| model.zone_production(self.zones, idx))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_floor(purpose, &mut productions);

        let raw_attractions = self
            .zones
            .zones()
            .iter()
            .map(|zone| self.attraction_rates.raw_attraction(purpose, zone))
            .collect::<Result<Vec<_>, _>>()?;

        let total_production: f64 = productions.iter().sum();
        let total_raw_attraction: f64 = raw_attractions.iter().sum();
        if total_raw_attraction == 0.0 {
            return Err(TdmError::ModelDegeneracy {
                purpose: *purpose,
                reason: String::from(
                    "total raw attraction is zero, attractions cannot be balanced to productions",
                ),
            });
        }
        if !total_production.is_finite() {
            return Err(TdmError::ModelDegeneracy {
                purpose: *purpose,
                reason: format!("total production {total_production} is not finite"),
            });
        }
        if total_production < 0.0 {
            return Err(TdmError::ModelDegeneracy {
                purpose: *purpose,
                reason: format!(
                    "total production {total_production:.3} is negative, balanced attractions would be negative"
                ),
            });
        }

        let scale = total_production / total_raw_attraction;
        let balanced_attractions = raw_attractions.iter().map(|a| a * scale).collect_vec();
        log::info!(
            "{purpose}: {total_production:.1} productions, {total_raw_attraction:.1} raw attractions, scale {scale:.6}"
        );

        Ok(PurposeTripEnds {
            purpose: *purpose,
            productions,
            raw_attractions,
            balanced_attractions,
            scale,
        })
    }

    fn apply_floor(&self, purpose: &TripPurpose, productions: &mut [f64]) {
        match self.production_floor {
            Some(floor) => {
                let mut floored = 0;
                for p in productions.iter_mut() {
                    if *p < floor {
                        *p = floor;
                        floored += 1;
                    }
                }
                if floored > 0 {
                    log::warn!("{purpose}: raised {floored} zone productions to floor {floor}");
                }
            }
            None => {
                let negative = productions.iter().filter(|p| **p < 0.0).count();
                if negative > 0 {
                    log::warn!(
                        "{purpose}: {negative} zones have negative production; configure a production floor to clamp them"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        zone::{ImputationPolicy, ZoneAttribute, ZoneRecord},
        Predictor,
    };
    use std::collections::HashMap;

    fn zones() -> ZoneTable {
        ZoneTable::new(
            vec![
                ZoneRecord::new("a", 100.0, 10.0, 20.0, 30.0).with_household_counts(20.0, 0.0, 0.0, 0.0),
                ZoneRecord::new("b", 300.0, 50.0, 0.0, 5.0).with_household_counts(150.0, 0.0, 0.0, 0.0),
                ZoneRecord::new("c", 0.0, 200.0, 80.0, 10.0),
            ],
            ImputationPolicy::RegionMedian,
        )
        .unwrap()
    }

    fn models() -> BTreeMap<TripPurpose, TripPurposeModel> {
        TripPurpose::ALL
            .iter()
            .map(|p| {
                let coefficients = BTreeMap::from([(Predictor::HasChildren, 1.0)]);
                (*p, TripPurposeModel::new(*p, 1.5, coefficients))
            })
            .collect()
    }

    #[test]
    fn test_balanced_attractions_conserve_productions() {
        let zones = zones();
        let models = models();
        let rates = AttractionRates::default();
        let engine = ProductionAttractionEngine::new(&models, &zones, &rates, None);
        let table = ProductionAttractionTable(
            TripPurpose::ALL
                .iter()
                .map(|p| (*p, engine.compute_purpose(p).unwrap()))
                .collect(),
        );
        for purpose in TripPurpose::ALL {
            let ends = table.get(&purpose).unwrap();
            let diff = (ends.total_balanced_attraction() - ends.total_production()).abs();
            assert!(diff < 1e-9 * ends.total_production().max(1.0));
            assert!(ends.balanced_attractions.iter().all(|a| *a >= 0.0));
        }
        // zone a: (1.5 + 0.2) * 100, zone b: (1.5 + 0.5) * 300, zone c has no households
        let hbw = table.get(&TripPurpose::Hbw).unwrap();
        assert!((hbw.productions[0] - 170.0).abs() < 1e-9);
        assert!((hbw.productions[1] - 600.0).abs() < 1e-9);
        assert_eq!(hbw.productions[2], 0.0);
        assert_eq!(table.rows(&zones).len(), 9);
    }

    #[test]
    fn test_zero_raw_attraction_fails_loudly() {
        let zones = zones();
        let models = models();
        let rates = AttractionRates(HashMap::from([(
            TripPurpose::Hbw,
            BTreeMap::from([(ZoneAttribute::EmploymentRetail, 0.0)]),
        )]));
        let engine = ProductionAttractionEngine::new(&models, &zones, &rates, None);
        let result = engine.compute_purpose(&TripPurpose::Hbw);
        assert!(matches!(result, Err(TdmError::ModelDegeneracy { .. })));
    }

    #[test]
    fn test_production_floor_applied() {
        let zones = zones();
        let models = BTreeMap::from([(
            TripPurpose::Nhb,
            TripPurposeModel::new(
                TripPurpose::Nhb,
                -1.0,
                BTreeMap::from([(Predictor::HasChildren, 1.0)]),
            ),
        )]);
        let rates = AttractionRates::default();
        let floored = ProductionAttractionEngine::new(&models, &zones, &rates, Some(0.0))
            .compute_purpose(&TripPurpose::Nhb)
            .unwrap();
        assert!(floored.productions.iter().all(|p| *p >= 0.0));
        assert!(floored.balanced_attractions.iter().all(|a| *a >= 0.0));
    }

    #[test]
    fn test_negative_total_production_is_degenerate() {
        let zones = zones();
        let rates = AttractionRates::default();
        let model_with_intercept = |intercept: f64| {
            BTreeMap::from([(
                TripPurpose::Nhb,
                TripPurposeModel::new(
                    TripPurpose::Nhb,
                    intercept,
                    BTreeMap::from([(Predictor::HasChildren, 1.0)]),
                ),
            )])
        };
        // zone a: (-1.0 + 0.2) * 100, zone b: (-1.0 + 0.5) * 300
        let models = model_with_intercept(-1.0);
        let result = ProductionAttractionEngine::new(&models, &zones, &rates, None)
            .compute_purpose(&TripPurpose::Nhb);
        assert!(matches!(result, Err(TdmError::ModelDegeneracy { .. })));

        // zone a: (-0.3 + 0.2) * 100 = -10, zone b: (-0.3 + 0.5) * 300 = 60
        let models = model_with_intercept(-0.3);
        let ends = ProductionAttractionEngine::new(&models, &zones, &rates, None)
            .compute_purpose(&TripPurpose::Nhb)
            .unwrap();
        assert!(ends.productions[0] < 0.0);
        assert!((ends.total_production() - 50.0).abs() < 1e-9);
        assert!(ends.balanced_attractions.iter().all(|a| *a >= 0.0));
    }
}
