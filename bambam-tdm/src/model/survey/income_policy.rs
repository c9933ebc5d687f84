use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// policy for survey households whose income is missing, zero or negative and
/// therefore has no log2 transform.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NonPositiveIncomePolicy {
    /// drop the household from the fit
    #[default]
    Exclude,
    /// replace the income with the median of the strictly positive incomes
    ImputeMedian,
    /// reject the survey with a data error
    Fail,
}

impl Display for NonPositiveIncomePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonPositiveIncomePolicy::Exclude => write!(f, "exclude"),
            NonPositiveIncomePolicy::ImputeMedian => write!(f, "impute_median"),
            NonPositiveIncomePolicy::Fail => write!(f, "fail"),
        }
    }
}
