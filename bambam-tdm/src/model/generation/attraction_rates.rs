use crate::model::{
    zone::{ZoneAttribute, ZoneRecord},
    TdmError, TripPurpose,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// fixed empirical trip attraction rates per purpose, applied as a linear
/// combination of zone totals. these are configuration, not estimated.
///
/// # Example
///
/// ```json
/// {
///   "hbw": { "employment_total": 1.45 },
///   "hbo": { "households": 0.9, "employment_basic": 0.5, "employment_retail": 9.0, "employment_service": 1.7 }
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct AttractionRates(pub HashMap<TripPurpose, BTreeMap<ZoneAttribute, f64>>);

impl Default for AttractionRates {
    fn default() -> Self {
        use ZoneAttribute as A;
        let hbw = BTreeMap::from([(A::EmploymentTotal, 1.45)]);
        let hbo = BTreeMap::from([
            (A::Households, 0.9),
            (A::EmploymentBasic, 0.5),
            (A::EmploymentRetail, 9.0),
            (A::EmploymentService, 1.7),
        ]);
        let nhb = BTreeMap::from([
            (A::Households, 0.5),
            (A::EmploymentBasic, 0.5),
            (A::EmploymentRetail, 4.1),
            (A::EmploymentService, 1.2),
        ]);
        AttractionRates(HashMap::from([
            (TripPurpose::Hbw, hbw),
            (TripPurpose::Hbo, hbo),
            (TripPurpose::Nhb, nhb),
        ]))
    }
}

impl AttractionRates {
    pub fn get_rates(
        &self,
        purpose: &TripPurpose,
    ) -> Result<&BTreeMap<ZoneAttribute, f64>, TdmError> {
        self.0.get(purpose).ok_or_else(|| {
            TdmError::ConfigurationError(format!("no attraction rates configured for {purpose}"))
        })
    }

    /// the raw (unbalanced) attraction of a zone for a purpose.
    pub fn raw_attraction(&self, purpose: &TripPurpose, zone: &ZoneRecord) -> Result<f64, TdmError> {
        let rates = self.get_rates(purpose)?;
        let attraction: f64 = rates
            .iter()
            .map(|(attribute, rate)| rate * zone.get_attribute(attribute))
            .sum();
        if !attraction.is_finite() || attraction < 0.0 {
            return Err(TdmError::InvalidZoneData(format!(
                "zone {} has invalid {purpose} raw attraction {attraction}",
                zone.zone_id
            )));
        }
        Ok(attraction)
    }

    pub fn validate(&self) -> Result<(), TdmError> {
        for (purpose, rates) in self.0.iter() {
            for (attribute, rate) in rates.iter() {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(TdmError::ConfigurationError(format!(
                        "{purpose} attraction rate for {attribute} must be a non-negative number, found {rate}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates_work_purpose() {
        let rates = AttractionRates::default();
        let zone = ZoneRecord::new("z", 10.0, 100.0, 50.0, 50.0);
        let hbw = rates.raw_attraction(&TripPurpose::Hbw, &zone).unwrap();
        assert!((hbw - 290.0).abs() < 1e-9);
        let nhb = rates.raw_attraction(&TripPurpose::Nhb, &zone).unwrap();
        assert!((nhb - (5.0 + 50.0 + 205.0 + 60.0)).abs() < 1e-9);
        assert!(rates.validate().is_ok());
    }

    #[test]
    fn test_deserialize_rates() {
        let json = r#"{ "hbw": { "employment_total": 1.2 }, "nhb": { "households": 0.4 } }"#;
        let rates: AttractionRates = serde_json::from_str(json).unwrap();
        assert!(rates.get_rates(&TripPurpose::Hbo).is_err());
        assert_eq!(rates.get_rates(&TripPurpose::Hbw).unwrap()[&ZoneAttribute::EmploymentTotal], 1.2);
    }
}
