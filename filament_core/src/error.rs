use thiserror::Error;

/// Runtime failure of the tracker or the motor ramp.
#[derive(Debug, Error, Clone)]
pub enum DispenserError {
    /// Backend error without a more specific mapping.
    #[error("hardware error: {0}")]
    Hardware(String),
    /// Driver or GPIO fault that needs operator attention.
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for load cell")]
    Timeout,
}

/// Rejected runtime configuration, raised by the constructors.
#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid ramp profile: min_dc {min_dc} > max_dc {max_dc}")]
    InvalidRamp { min_dc: u8, max_dc: u8 },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
