use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    /// Pin could not be claimed or configured.
    #[error("gpio error: {0}")]
    Gpio(String),
    /// DOUT stayed high past the conversion deadline.
    #[error("hx711 data-ready timeout")]
    DataReadyTimeout,
}

pub type Result<T> = std::result::Result<T, HwError>;
