//! `From` implementations bridging `filament_config` types to `filament_core` types.

use crate::config::{MotorCfg, RampProfile, TrackerCfg, Wiring};
use crate::filter::FilterThresholds;
use crate::spool::{Diameter, Material, RollSize, SpoolSelection};
use std::time::Duration;

// ── Spool ────────────────────────────────────────────────────────────────────

impl From<filament_config::MaterialName> for Material {
    fn from(m: filament_config::MaterialName) -> Self {
        match m {
            filament_config::MaterialName::Pla => Material::Pla,
            filament_config::MaterialName::Abs => Material::Abs,
        }
    }
}

impl From<filament_config::DiameterName> for Diameter {
    fn from(d: filament_config::DiameterName) -> Self {
        match d {
            filament_config::DiameterName::D175 => Diameter::D175,
            filament_config::DiameterName::D300 => Diameter::D300,
        }
    }
}

impl From<filament_config::RollName> for RollSize {
    fn from(r: filament_config::RollName) -> Self {
        match r {
            filament_config::RollName::OneKg => RollSize::OneKg,
            filament_config::RollName::TwoKg => RollSize::TwoKg,
        }
    }
}

impl From<&filament_config::SpoolCfg> for SpoolSelection {
    fn from(c: &filament_config::SpoolCfg) -> Self {
        Self {
            material: c.material.into(),
            diameter: c.diameter.into(),
            roll: c.roll.into(),
        }
    }
}

// ── TrackerCfg ───────────────────────────────────────────────────────────────

impl From<&filament_config::Config> for TrackerCfg {
    fn from(c: &filament_config::Config) -> Self {
        Self {
            calibration_factor: c.scale.calibration_factor,
            samples: c.scale.samples,
            calibration_steps: c.scale.calibration_steps,
            invert: c.scale.invert,
            sensor_timeout: Duration::from_millis(c.hardware.sensor_read_timeout_ms),
            thresholds: FilterThresholds {
                tension_g: c.tracker.tension_threshold_g,
                max_delta_in_range_g: c.tracker.max_delta_in_range_g,
            },
            scale_resolution_g: c.tracker.scale_resolution_g,
            motor_group_g: if c.tracker.motor_group_on_scale {
                c.tracker.motor_group_weight_g
            } else {
                0.0
            },
            default_spool: (&c.spool).into(),
        }
    }
}

// ── MotorCfg ─────────────────────────────────────────────────────────────────

impl From<filament_config::Wiring> for Wiring {
    fn from(w: filament_config::Wiring) -> Self {
        match w {
            filament_config::Wiring::Standard => Wiring::Standard,
            filament_config::Wiring::HighCurrent => Wiring::HighCurrent,
        }
    }
}

impl From<&filament_config::RampCfg> for RampProfile {
    fn from(r: &filament_config::RampCfg) -> Self {
        RampProfile::new(r.min_dc, r.max_dc, Duration::from_millis(r.step_delay_ms))
    }
}

impl From<&filament_config::MotorCfg> for MotorCfg {
    fn from(c: &filament_config::MotorCfg) -> Self {
        Self {
            wiring: c.wiring.into(),
            ignore_open_load: c.ignore_open_load,
            extruder: (&c.extruder).into(),
            feed: (&c.feed).into(),
            load: (&c.load).into(),
            pulse_short: Duration::from_millis(c.pulse_short_ms),
            pulse_long: Duration::from_millis(c.pulse_long_ms),
        }
    }
}
