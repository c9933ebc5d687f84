use super::ols_ops;
use crate::model::{
    survey::{HouseholdRecord, NonPositiveIncomePolicy, SurveyDesign},
    zone::ZoneTable,
    Predictor, TdmError, TripPurpose,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// a linear trip rate model for one purpose, fit once from household survey
/// records and immutable afterward.
///
/// the model is estimated on households but applied to zones by substituting
/// zone shares for the household indicators (see [`Predictor`]). this
/// ecological-inference approximation is part of the model design and is
/// not corrected here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TripPurposeModel {
    pub purpose: TripPurpose,
    pub intercept: f64,
    pub coefficients: BTreeMap<Predictor, f64>,
    /// households used in the fit, zero for models that were not estimated
    #[serde(default)]
    pub observations: usize,
    #[serde(default)]
    pub excluded: usize,
    #[serde(default)]
    pub imputed: usize,
    #[serde(default)]
    pub r_squared: Option<f64>,
}

impl TripPurposeModel {
    /// a model with known coefficients, e.g. transferred from another region.
    pub fn new(
        purpose: TripPurpose,
        intercept: f64,
        coefficients: BTreeMap<Predictor, f64>,
    ) -> TripPurposeModel {
        TripPurposeModel {
            purpose,
            intercept,
            coefficients,
            observations: 0,
            excluded: 0,
            imputed: 0,
            r_squared: None,
        }
    }

    /// estimates the model by ordinary least squares of the purpose trip
    /// count on the predictors.
    pub fn fit(
        households: &[HouseholdRecord],
        purpose: TripPurpose,
        predictors: &[Predictor],
        income_policy: NonPositiveIncomePolicy,
    ) -> Result<TripPurposeModel, TdmError> {
        let mut unique = predictors.to_vec();
        unique.sort();
        unique.dedup();
        if unique.len() != predictors.len() {
            return Err(TdmError::ConfigurationError(format!(
                "{purpose} model lists a predictor more than once"
            )));
        }

        let design = SurveyDesign::new(households, purpose, predictors, income_policy)?;
        let parameters = predictors.len() + 1;
        if design.len() < parameters {
            return Err(TdmError::InsufficientObservations {
                purpose,
                observations: design.len(),
                parameters,
            });
        }

        let fit = ols_ops::ordinary_least_squares(&design.rows, &design.observations)
            .map_err(|reason| TdmError::ModelDegeneracy { purpose, reason })?;
        let coefficients = predictors
            .iter()
            .copied()
            .zip(fit.coefficients.iter().copied())
            .collect::<BTreeMap<_, _>>();

        log::info!(
            "fit {purpose} model on {} households: intercept {:.4}, R^2 {:.4}",
            design.len(),
            fit.intercept,
            fit.r_squared
        );

        Ok(TripPurposeModel {
            purpose,
            intercept: fit.intercept,
            coefficients,
            observations: design.len(),
            excluded: design.excluded,
            imputed: design.imputed,
            r_squared: Some(fit.r_squared),
        })
    }

    /// the expected trips per household for the zone at `index`, evaluated
    /// on zone-aggregate predictors.
    pub fn household_rate(&self, zones: &ZoneTable, index: usize) -> Result<f64, TdmError> {
        let mut rate = self.intercept;
        for (predictor, coefficient) in self.coefficients.iter() {
            rate += coefficient * zones.get_predictor(index, predictor)?;
        }
        Ok(rate)
    }

    /// zone production: household rate times the zone household count. may be
    /// negative when the zone lies outside the fitted domain; no floor is
    /// applied here.
    pub fn zone_production(&self, zones: &ZoneTable, index: usize) -> Result<f64, TdmError> {
        let households = zones
            .get(index)
            .map(|z| z.households)
            .ok_or_else(|| TdmError::InternalError(format!("zone index {index} out of bounds")))?;
        if households == 0.0 {
            return Ok(0.0);
        }
        let rate = self.household_rate(zones, index)?;
        Ok(rate * households)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::zone::{ImputationPolicy, ZoneRecord};

    fn household(id: usize, income: f64, children: bool, owns: bool, elderly: bool) -> HouseholdRecord {
        let log_income = (income / 1000.0).log2();
        // hbw = 0.5 + 0.25 log2(income) + 1.0 children + 0.5 owns - 0.75 elderly
        let hbw = 0.5 + 0.25 * log_income
            + if children { 1.0 } else { 0.0 }
            + if owns { 0.5 } else { 0.0 }
            - if elderly { 0.75 } else { 0.0 };
        HouseholdRecord {
            household_id: format!("h{id}"),
            hbw_trips: hbw.round() as u32,
            hbo_trips: 2,
            nhb_trips: 1,
            income: Some(income),
            has_children: children,
            has_elderly: elderly,
            owns_home: owns,
            has_vehicle: true,
        }
    }

    fn survey() -> Vec<HouseholdRecord> {
        let incomes = [16_000.0, 32_000.0, 64_000.0, 128_000.0];
        let mut out = vec![];
        let mut id = 0;
        for income in incomes {
            for children in [false, true] {
                for owns in [false, true] {
                    for elderly in [false, true] {
                        out.push(household(id, income, children, owns, elderly));
                        id += 1;
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_fit_constant_purpose() {
        let model = TripPurposeModel::fit(
            &survey(),
            TripPurpose::Hbo,
            &Predictor::DEFAULT,
            NonPositiveIncomePolicy::Exclude,
        )
        .unwrap();
        assert!((model.intercept - 2.0).abs() < 1e-9);
        assert!(model.coefficients.values().all(|c| c.abs() < 1e-9));
        assert_eq!(model.observations, 32);
    }

    #[test]
    fn test_fit_signs_follow_data() {
        let model = TripPurposeModel::fit(
            &survey(),
            TripPurpose::Hbw,
            &Predictor::DEFAULT,
            NonPositiveIncomePolicy::Exclude,
        )
        .unwrap();
        assert!(model.coefficients[&Predictor::HasChildren] > 0.5);
        assert!(model.coefficients[&Predictor::HasElderly] < 0.0);
        assert!(model.r_squared.unwrap() > 0.5);
    }

    #[test]
    fn test_constant_predictor_is_degenerate() {
        // every household owns a vehicle
        let result = TripPurposeModel::fit(
            &survey(),
            TripPurpose::Hbw,
            &[Predictor::HasChildren, Predictor::HasVehicle],
            NonPositiveIncomePolicy::Exclude,
        );
        assert!(matches!(result, Err(TdmError::ModelDegeneracy { .. })));
    }

    #[test]
    fn test_insufficient_observations() {
        let result = TripPurposeModel::fit(
            &survey()[0..3],
            TripPurpose::Hbw,
            &Predictor::DEFAULT,
            NonPositiveIncomePolicy::Exclude,
        );
        assert!(matches!(
            result,
            Err(TdmError::InsufficientObservations { .. })
        ));
    }

    #[test]
    fn test_zone_production_uses_shares() {
        let coefficients = BTreeMap::from([
            (Predictor::Log2Income, 0.5),
            (Predictor::HasChildren, 2.0),
        ]);
        let model = TripPurposeModel::new(TripPurpose::Hbw, 1.0, coefficients);
        let zones = ZoneTable::new(
            vec![
                ZoneRecord::new("z1", 100.0, 0.0, 0.0, 0.0)
                    .with_median_income(16_000.0)
                    .with_household_counts(50.0, 0.0, 0.0, 0.0),
                ZoneRecord::new("z2", 0.0, 10.0, 0.0, 0.0),
            ],
            ImputationPolicy::RegionMedian,
        )
        .unwrap();
        // rate = 1 + 0.5 * 4 + 2 * 0.5 = 4
        let production = model.zone_production(&zones, 0).unwrap();
        assert!((production - 400.0).abs() < 1e-9);
        assert_eq!(model.zone_production(&zones, 1).unwrap(), 0.0);
    }
}
