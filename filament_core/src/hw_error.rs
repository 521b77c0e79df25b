//! Maps `Box<dyn Error>` from trait boundaries to typed `DispenserError`.
//!
//! `filament_traits` hands out `Box<dyn Error + Send + Sync>` so any backend
//! can plug in; this module turns those into the core's error enum, with an
//! optional feature-gated path for `filament_hardware::HwError` downcasting.

use crate::error::DispenserError;

/// Map a trait-boundary error to a typed `DispenserError`.
///
/// Known hardware error types are downcast first, then string heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DispenserError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<filament_hardware::error::HwError>() {
            return match hw {
                filament_hardware::error::HwError::DataReadyTimeout => DispenserError::Timeout,
                other @ filament_hardware::error::HwError::Gpio(_) => {
                    DispenserError::HardwareFault(other.to_string())
                }
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DispenserError::Timeout
    } else {
        DispenserError::Hardware(s)
    }
}

/// Wrap a boxed backend error into an `eyre::Report` carrying the typed error.
pub(crate) fn report(e: &filament_traits::BoxError) -> eyre::Report {
    eyre::Report::new(map_hw_error(&**e))
}
