use crate::model::{predictor::log2_income_thousands, Predictor, TripPurpose};
use serde::{de, Deserialize, Deserializer, Serialize};

/// a household of the travel survey with its observed trip counts per purpose.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HouseholdRecord {
    pub household_id: String,
    pub hbw_trips: u32,
    pub hbo_trips: u32,
    pub nhb_trips: u32,
    /// household income in dollars
    pub income: Option<f64>,
    #[serde(deserialize_with = "deserialize_indicator")]
    pub has_children: bool,
    #[serde(deserialize_with = "deserialize_indicator")]
    pub has_elderly: bool,
    #[serde(deserialize_with = "deserialize_indicator")]
    pub owns_home: bool,
    #[serde(deserialize_with = "deserialize_indicator")]
    pub has_vehicle: bool,
}

impl HouseholdRecord {
    pub fn get_trips(&self, purpose: &TripPurpose) -> u32 {
        match purpose {
            TripPurpose::Hbw => self.hbw_trips,
            TripPurpose::Hbo => self.hbo_trips,
            TripPurpose::Nhb => self.nhb_trips,
        }
    }

    /// the household value of a predictor. None only for an income that
    /// cannot be log-transformed.
    pub fn get_predictor(&self, predictor: &Predictor) -> Option<f64> {
        let indicator = |b: bool| if b { 1.0 } else { 0.0 };
        match predictor {
            Predictor::Log2Income => self.income.and_then(log2_income_thousands),
            Predictor::HasChildren => Some(indicator(self.has_children)),
            Predictor::HasElderly => Some(indicator(self.has_elderly)),
            Predictor::OwnsHome => Some(indicator(self.owns_home)),
            Predictor::HasVehicle => Some(indicator(self.has_vehicle)),
        }
    }

    pub fn has_valid_income(&self) -> bool {
        self.income.and_then(log2_income_thousands).is_some()
    }
}

/// survey exports encode indicators as 0/1 as often as true/false.
fn deserialize_indicator<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Ok(true),
        "0" | "false" | "f" | "no" | "n" => Ok(false),
        other => Err(de::Error::custom(format!(
            "expected a 0/1 or true/false indicator, found '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_csv_indicators() {
        let data = "household_id,hbw_trips,hbo_trips,nhb_trips,income,has_children,has_elderly,owns_home,has_vehicle\n\
                    h1,2,3,1,50000,1,0,true,F\n\
                    h2,0,1,0,,0,1,0,1\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows = reader
            .deserialize::<HouseholdRecord>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].has_children && !rows[0].has_elderly && rows[0].owns_home);
        assert!(!rows[0].has_vehicle);
        assert_eq!(rows[0].get_trips(&TripPurpose::Hbo), 3);
        assert_eq!(rows[1].income, None);
        assert!(!rows[1].has_valid_income());
    }
}
