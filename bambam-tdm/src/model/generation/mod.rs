mod attraction_rates;
pub mod ols_ops;
mod production_attraction;
mod trip_purpose_model;

pub use attraction_rates::AttractionRates;
pub use production_attraction::{
    ProductionAttractionEngine, ProductionAttractionRow, ProductionAttractionTable,
    PurposeTripEnds,
};
pub use trip_purpose_model::TripPurposeModel;
