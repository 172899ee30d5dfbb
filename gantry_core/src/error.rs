use thiserror::Error;

use crate::kinematics::Axis;

#[derive(Debug, Error, Clone)]
pub enum GantryError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("homing timed out on axis {axis} after {elapsed_ms} ms")]
    HomingTimeout { axis: Axis, elapsed_ms: u64 },
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing peripherals")]
    MissingPeripherals,
    #[error("missing command feed")]
    MissingFeed,
    #[error("missing plate plan")]
    MissingPlan,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

// Map any error to a typed GantryError, with special handling for hardware errors.
pub(crate) fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> GantryError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<gantry_hardware::error::HwError>() {
        return GantryError::HardwareFault(hw.to_string());
    }
    GantryError::Hardware(e.to_string())
}
