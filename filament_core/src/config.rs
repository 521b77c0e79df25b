//! Runtime configuration of the tracker and the motor ramp.
//!
//! These are separate from the TOML-deserialized config in `filament_config`;
//! see `conversions` for the mapping.

use crate::error::BuildError;
use crate::filter::FilterThresholds;
use crate::spool::SpoolSelection;
use std::time::Duration;

/// Weight tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerCfg {
    /// Raw units per gram applied at `begin()` and after every reset.
    pub calibration_factor: f32,
    /// Conversions averaged per reading.
    pub samples: u8,
    /// Conversions averaged in the calibration measure phase.
    pub calibration_steps: u8,
    /// Negate readings (cell mounted upside down).
    pub invert: bool,
    /// Max wait for one conversion.
    pub sensor_timeout: Duration,
    pub thresholds: FilterThresholds,
    /// Consumption below this is noise and is not published.
    pub scale_resolution_g: f32,
    /// Motor group weight resting on the cell; 0 when mounted elsewhere.
    pub motor_group_g: f32,
    /// Spool restored by `reset()`.
    pub default_spool: SpoolSelection,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            calibration_factor: 434.5,
            samples: 10,
            calibration_steps: 10,
            invert: true,
            sensor_timeout: Duration::from_millis(150),
            thresholds: FilterThresholds::default(),
            scale_resolution_g: 1.5,
            motor_group_g: 158.5,
            default_spool: SpoolSelection::default(),
        }
    }
}

/// How the motor poles are wired to the half-bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum Wiring {
    /// HB1 on pole A, HB2 on pole B.
    #[default]
    #[strum(serialize = "standard")]
    Standard,
    /// HB1+HB2 on pole A, HB3+HB4 on pole B.
    #[strum(serialize = "high-current")]
    HighCurrent,
}

/// Duty-cycle bounds and pacing of one ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampProfile {
    pub min_dc: u8,
    pub max_dc: u8,
    /// Delay between two duty steps.
    pub step_delay: Duration,
}

impl RampProfile {
    pub const fn new(min_dc: u8, max_dc: u8, step_delay: Duration) -> Self {
        Self {
            min_dc,
            max_dc,
            step_delay,
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.min_dc > self.max_dc {
            return Err(BuildError::InvalidRamp {
                min_dc: self.min_dc,
                max_dc: self.max_dc,
            });
        }
        Ok(())
    }

    /// Number of duty writes in one ramp up (or down).
    pub fn steps(&self) -> u32 {
        u32::from(self.max_dc.saturating_sub(self.min_dc)) + 1
    }
}

/// Motor ramp configuration with the firmware presets.
#[derive(Debug, Clone)]
pub struct MotorCfg {
    pub wiring: Wiring,
    /// Hide an open-load bit when it is the only one set.
    pub ignore_open_load: bool,
    pub extruder: RampProfile,
    pub feed: RampProfile,
    pub load: RampProfile,
    /// Extruder pulse in automatic mode.
    pub pulse_short: Duration,
    /// Manual feed/pull pulse.
    pub pulse_long: Duration,
}

impl Default for MotorCfg {
    fn default() -> Self {
        Self {
            wiring: Wiring::Standard,
            ignore_open_load: true,
            extruder: RampProfile::new(40, 128, Duration::from_millis(10)),
            feed: RampProfile::new(64, 255, Duration::from_millis(5)),
            load: RampProfile::new(64, 255, Duration::from_millis(5)),
            pulse_short: Duration::from_millis(100),
            pulse_long: Duration::from_millis(500),
        }
    }
}

impl MotorCfg {
    pub fn validate(&self) -> Result<(), BuildError> {
        self.extruder.validate()?;
        self.feed.validate()?;
        self.load.validate()?;
        Ok(())
    }
}
