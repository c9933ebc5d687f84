mod calibration_config;
mod decay_calibration;

pub use calibration_config::CalibrationConfig;
pub use decay_calibration::{CalibrationResult, DecayCalibration};
