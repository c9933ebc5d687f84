use crate::model::{zone::ZoneId, TdmError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// maps each zone onto a reporting group.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ZoneGrouping {
    /// groups zones by the leading characters of their identifier. for
    /// 11-character census tract GEOIDs a length of 5 groups by county.
    Prefix { length: usize },
    /// an explicit zone id -> group name assignment that must cover every zone
    Explicit { groups: HashMap<String, String> },
}

impl ZoneGrouping {
    pub fn county() -> ZoneGrouping {
        ZoneGrouping::Prefix { length: 5 }
    }

    pub fn group_of(&self, zone_id: &ZoneId) -> Result<String, TdmError> {
        match self {
            ZoneGrouping::Prefix { length } if *length == 0 => Err(
                TdmError::ConfigurationError(String::from("group prefix length must be positive")),
            ),
            ZoneGrouping::Prefix { length } => Ok(zone_id.prefix(*length).to_string()),
            ZoneGrouping::Explicit { groups } => {
                groups.get(zone_id.as_str()).cloned().ok_or_else(|| {
                    TdmError::InvalidZoneData(format!("zone {zone_id} has no group assignment"))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_explicit() {
        let tract = ZoneId::new("08031000100");
        assert_eq!(ZoneGrouping::county().group_of(&tract).unwrap(), "08031");
        let explicit = ZoneGrouping::Explicit {
            groups: HashMap::from([(String::from("08031000100"), String::from("denver"))]),
        };
        assert_eq!(explicit.group_of(&tract).unwrap(), "denver");
        assert!(matches!(
            explicit.group_of(&ZoneId::new("08005000100")),
            Err(TdmError::InvalidZoneData(_))
        ));
    }

    #[test]
    fn test_deserialize_tagged() {
        let grouping: ZoneGrouping = serde_json::from_str(r#"{"type":"prefix","length":5}"#).unwrap();
        assert_eq!(grouping, ZoneGrouping::county());
    }
}
