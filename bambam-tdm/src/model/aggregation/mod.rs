mod aggregation_config;
mod flow_aggregator;
mod flow_summary;
mod group_matrix;
mod zone_grouping;

pub use aggregation_config::AggregationConfig;
pub use flow_aggregator::FlowAggregator;
pub use flow_summary::{FlowSummary, MarginalReportRow, TravelTimeValidation, TripLengthBin};
pub use group_matrix::{GroupFlow, GroupMatrix};
pub use zone_grouping::ZoneGrouping;
