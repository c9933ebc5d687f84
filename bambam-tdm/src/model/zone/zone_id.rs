use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// stable string key of a zone, unique across the region. for US
/// applications this is typically a census GEOID.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: &str) -> ZoneId {
        ZoneId(id.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// the leading `n` characters of this identifier, used to group zones
    /// hierarchically (e.g. tract GEOID -> county GEOID). identifiers shorter
    /// than `n` are returned whole.
    pub fn prefix(&self, n: usize) -> ZoneId {
        ZoneId(self.0.chars().take(n).collect())
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        ZoneId::new(value)
    }
}
