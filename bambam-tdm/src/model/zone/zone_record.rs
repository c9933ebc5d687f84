use super::{ZoneAttribute, ZoneId};
use crate::model::{predictor::log2_income_thousands, Predictor};
use serde::{Deserialize, Serialize};

/// a row of the zone attribute table, as joined by the upstream demographic
/// and employment collaborators. optional columns may be empty in the source
/// file and are imputed by the [`super::ZoneTable`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ZoneRecord {
    pub zone_id: ZoneId,
    pub households: f64,
    /// median household income in dollars
    pub median_income: Option<f64>,
    pub households_with_children: Option<f64>,
    pub households_with_elderly: Option<f64>,
    pub owner_households: Option<f64>,
    pub vehicle_households: Option<f64>,
    #[serde(default)]
    pub employment_basic: f64,
    #[serde(default)]
    pub employment_retail: f64,
    #[serde(default)]
    pub employment_service: f64,
    /// when empty, the sum of the three sectors
    pub employment_total: Option<f64>,
}

impl ZoneRecord {
    /// a zone with household and employment totals only. all predictor
    /// inputs are missing.
    pub fn new(
        zone_id: &str,
        households: f64,
        employment_basic: f64,
        employment_retail: f64,
        employment_service: f64,
    ) -> ZoneRecord {
        ZoneRecord {
            zone_id: ZoneId::new(zone_id),
            households,
            median_income: None,
            households_with_children: None,
            households_with_elderly: None,
            owner_households: None,
            vehicle_households: None,
            employment_basic,
            employment_retail,
            employment_service,
            employment_total: None,
        }
    }

    pub fn with_median_income(mut self, income: f64) -> Self {
        self.median_income = Some(income);
        self
    }

    pub fn with_household_counts(
        mut self,
        with_children: f64,
        with_elderly: f64,
        owners: f64,
        with_vehicle: f64,
    ) -> Self {
        self.households_with_children = Some(with_children);
        self.households_with_elderly = Some(with_elderly);
        self.owner_households = Some(owners);
        self.vehicle_households = Some(with_vehicle);
        self
    }

    pub fn get_employment_total(&self) -> f64 {
        self.employment_total.unwrap_or(
            self.employment_basic + self.employment_retail + self.employment_service,
        )
    }

    pub fn get_attribute(&self, attribute: &ZoneAttribute) -> f64 {
        match attribute {
            ZoneAttribute::Households => self.households,
            ZoneAttribute::EmploymentBasic => self.employment_basic,
            ZoneAttribute::EmploymentRetail => self.employment_retail,
            ZoneAttribute::EmploymentService => self.employment_service,
            ZoneAttribute::EmploymentTotal => self.get_employment_total(),
        }
    }

    fn household_count(&self, predictor: &Predictor) -> Option<f64> {
        match predictor {
            Predictor::Log2Income => None,
            Predictor::HasChildren => self.households_with_children,
            Predictor::HasElderly => self.households_with_elderly,
            Predictor::OwnsHome => self.owner_households,
            Predictor::HasVehicle => self.vehicle_households,
        }
    }

    /// the zone-aggregate value of a predictor, if this record provides it.
    /// indicator predictors become shares of households; a zone without
    /// households has a share of zero.
    pub fn observed_predictor(&self, predictor: &Predictor) -> Option<f64> {
        match predictor {
            Predictor::Log2Income => self.median_income.and_then(log2_income_thousands),
            _ => {
                let count = self.household_count(predictor)?;
                if self.households > 0.0 {
                    Some(count / self.households)
                } else {
                    Some(0.0)
                }
            }
        }
    }

    /// checks the non-negativity and share bounds of this record.
    pub fn validate(&self) -> Result<(), String> {
        let id = &self.zone_id;
        if id.as_str().is_empty() {
            return Err(String::from("zone with empty zone_id"));
        }
        let required = [
            ("households", self.households),
            ("employment_basic", self.employment_basic),
            ("employment_retail", self.employment_retail),
            ("employment_service", self.employment_service),
            ("employment_total", self.get_employment_total()),
        ];
        for (name, value) in required {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("zone {id} has invalid {name} value {value}"));
            }
        }
        let counts = [
            ("households_with_children", self.households_with_children),
            ("households_with_elderly", self.households_with_elderly),
            ("owner_households", self.owner_households),
            ("vehicle_households", self.vehicle_households),
        ];
        for (name, value) in counts {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("zone {id} has invalid {name} value {v}"));
                }
                if v > self.households {
                    return Err(format!(
                        "zone {id} has {name} value {v} exceeding its {} households",
                        self.households
                    ));
                }
            }
        }
        if let Some(income) = self.median_income {
            if income.is_nan() {
                return Err(format!("zone {id} has NaN median_income"));
            }
        }
        Ok(())
    }
}
