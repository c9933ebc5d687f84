mod decay_rates;
mod friction_factor_table;
mod travel_time_matrix;

pub use decay_rates::DecayRates;
pub use friction_factor_table::{FrictionFactor, FrictionFactorTable};
pub use travel_time_matrix::{TravelTimeMatrix, TravelTimePair, TravelTimeRecord};
