mod imputation_policy;
mod zone_attribute;
mod zone_id;
mod zone_record;
mod zone_table;

pub use imputation_policy::ImputationPolicy;
pub use zone_attribute::ZoneAttribute;
pub use zone_id::ZoneId;
pub use zone_record::ZoneRecord;
pub use zone_table::ZoneTable;
