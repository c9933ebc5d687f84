pub mod aggregation;
pub mod calibration;
pub mod distribution;
pub mod friction;
pub mod generation;
pub mod predictor;
pub mod survey;
mod tdm_error;
mod trip_purpose;
pub mod zone;

pub use predictor::Predictor;
pub use tdm_error::TdmError;
pub use trip_purpose::TripPurpose;
