mod household_record;
mod income_policy;
mod survey_design;

pub use household_record::HouseholdRecord;
pub use income_policy::NonPositiveIncomePolicy;
pub use survey_design::SurveyDesign;
