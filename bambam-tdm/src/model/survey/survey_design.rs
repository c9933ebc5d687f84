use super::{HouseholdRecord, NonPositiveIncomePolicy};
use crate::model::{predictor::log2_income_thousands, Predictor, TdmError, TripPurpose};
use crate::util::stats_ops;

/// the regression inputs for one trip purpose: a row of predictor values per
/// usable household (no intercept column) and the observed trip counts.
#[derive(Clone, Debug)]
pub struct SurveyDesign {
    pub purpose: TripPurpose,
    pub predictors: Vec<Predictor>,
    pub rows: Vec<Vec<f64>>,
    pub observations: Vec<f64>,
    /// households dropped under [`NonPositiveIncomePolicy::Exclude`]
    pub excluded: usize,
    /// households whose income was replaced under [`NonPositiveIncomePolicy::ImputeMedian`]
    pub imputed: usize,
}

impl SurveyDesign {
    /// builds the design for `purpose`, applying the income policy before the
    /// log transform so that no undefined logarithm reaches the fit.
    pub fn new(
        households: &[HouseholdRecord],
        purpose: TripPurpose,
        predictors: &[Predictor],
        income_policy: NonPositiveIncomePolicy,
    ) -> Result<SurveyDesign, TdmError> {
        let uses_income = predictors.contains(&Predictor::Log2Income);
        let invalid_income = households
            .iter()
            .filter(|h| !h.has_valid_income())
            .collect::<Vec<_>>();

        let imputed_income = match (uses_income, invalid_income.first(), income_policy) {
            (true, Some(h), NonPositiveIncomePolicy::Fail) => {
                return Err(TdmError::InvalidSurveyData(format!(
                    "household {} has income {:?} which has no log2 transform, and {} households in total are affected",
                    h.household_id,
                    h.income,
                    invalid_income.len()
                )));
            }
            (true, Some(_), NonPositiveIncomePolicy::ImputeMedian) => {
                let median = stats_ops::median(
                    households
                        .iter()
                        .filter(|h| h.has_valid_income())
                        .filter_map(|h| h.income),
                )
                .ok_or_else(|| {
                    TdmError::InvalidSurveyData(String::from(
                        "no household has a positive income, cannot impute a median income",
                    ))
                })?;
                log2_income_thousands(median)
            }
            _ => None,
        };

        let mut rows = Vec::with_capacity(households.len());
        let mut observations = Vec::with_capacity(households.len());
        let mut excluded = 0;
        let mut imputed = 0;
        for household in households.iter() {
            let valid_income = household.has_valid_income();
            if uses_income && !valid_income && imputed_income.is_none() {
                excluded += 1;
                continue;
            }
            let row = predictors
                .iter()
                .map(|p| match (p, household.get_predictor(p)) {
                    (_, Some(v)) => Ok(v),
                    (Predictor::Log2Income, None) => imputed_income.ok_or_else(|| {
                        TdmError::InternalError(format!(
                            "household {} missing income after policy {income_policy}",
                            household.household_id
                        ))
                    }),
                    (_, None) => Err(TdmError::InvalidSurveyData(format!(
                        "household {} missing predictor {p}",
                        household.household_id
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if uses_income && !valid_income {
                imputed += 1;
            }
            rows.push(row);
            observations.push(household.get_trips(&purpose) as f64);
        }

        if excluded > 0 {
            log::warn!(
                "{purpose} model: excluded {excluded} of {} survey households with non-positive or missing income",
                households.len()
            );
        }
        if imputed > 0 {
            log::warn!(
                "{purpose} model: imputed median income for {imputed} of {} survey households",
                households.len()
            );
        }

        Ok(SurveyDesign {
            purpose,
            predictors: predictors.to_vec(),
            rows,
            observations,
            excluded,
            imputed,
        })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household(id: &str, income: Option<f64>, trips: u32) -> HouseholdRecord {
        HouseholdRecord {
            household_id: id.to_string(),
            hbw_trips: trips,
            hbo_trips: 0,
            nhb_trips: 0,
            income,
            has_children: true,
            has_elderly: false,
            owns_home: true,
            has_vehicle: true,
        }
    }

    fn survey() -> Vec<HouseholdRecord> {
        vec![
            household("a", Some(16_000.0), 1),
            household("b", Some(0.0), 2),
            household("c", Some(64_000.0), 3),
            household("d", None, 4),
        ]
    }

    #[test]
    fn test_exclude_policy_drops_households() {
        let design = SurveyDesign::new(
            &survey(),
            TripPurpose::Hbw,
            &Predictor::DEFAULT,
            NonPositiveIncomePolicy::Exclude,
        )
        .unwrap();
        assert_eq!(design.len(), 2);
        assert_eq!(design.excluded, 2);
        assert_eq!(design.observations, vec![1.0, 3.0]);
        assert_eq!(design.rows[0], vec![4.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_impute_policy_uses_positive_median() {
        let design = SurveyDesign::new(
            &survey(),
            TripPurpose::Hbw,
            &[Predictor::Log2Income],
            NonPositiveIncomePolicy::ImputeMedian,
        )
        .unwrap();
        assert_eq!(design.len(), 4);
        assert_eq!(design.imputed, 2);
        // median of 16k and 64k is 40k
        let expected = (40.0_f64).log2();
        assert!((design.rows[1][0] - expected).abs() < 1e-12);
        assert!(design.rows.iter().all(|r| r[0].is_finite()));
    }

    #[test]
    fn test_fail_policy_is_a_data_error() {
        let result = SurveyDesign::new(
            &survey(),
            TripPurpose::Hbw,
            &Predictor::DEFAULT,
            NonPositiveIncomePolicy::Fail,
        );
        assert!(result.unwrap_err().is_data_error());
    }

    #[test]
    fn test_income_policy_ignored_without_income_predictor() {
        let design = SurveyDesign::new(
            &survey(),
            TripPurpose::Hbw,
            &[Predictor::HasChildren],
            NonPositiveIncomePolicy::Fail,
        )
        .unwrap();
        assert_eq!(design.len(), 4);
    }
}
