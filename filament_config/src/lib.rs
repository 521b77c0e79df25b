#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the filament dispenser.
//!
//! - `Config` and its sections are deserialized from TOML; every section has
//!   factory defaults so an empty file is a valid configuration.
//! - `Config::validate` rejects values the tracker or the motor ramp cannot
//!   work with.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub hx711_dout: u8,
    pub hx711_sck: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dout: 3,
            hx711_sck: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScaleCfg {
    /// Raw units per gram; the in-memory calibration constant at boot.
    pub calibration_factor: f32,
    /// Conversions averaged per weight reading.
    pub samples: u8,
    /// Conversions averaged in the calibration measure phase.
    pub calibration_steps: u8,
    /// The cell is mounted upside down on the frame: negate readings.
    pub invert: bool,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            calibration_factor: 434.5,
            samples: 10,
            calibration_steps: 10,
            invert: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerCfg {
    /// Delta (g) between two readings interpreted as the extruder pulling.
    pub tension_threshold_g: f32,
    /// Largest backward jump (g) accepted while the roll is being loaded.
    pub max_delta_in_range_g: f32,
    /// Consumption below this many grams is treated as noise.
    pub scale_resolution_g: f32,
    /// The motor group rests on the load cell and is part of the tare.
    pub motor_group_on_scale: bool,
    pub motor_group_weight_g: f32,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            tension_threshold_g: 100.0,
            max_delta_in_range_g: 10.0,
            scale_resolution_g: 1.5,
            motor_group_on_scale: true,
            motor_group_weight_g: 158.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaterialName {
    #[default]
    #[serde(alias = "PLA")]
    Pla,
    #[serde(alias = "ABS")]
    Abs,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiameterName {
    #[default]
    #[serde(rename = "1.75")]
    D175,
    #[serde(rename = "3.00", alias = "3.0")]
    D300,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollName {
    #[default]
    #[serde(rename = "1kg")]
    OneKg,
    #[serde(rename = "2kg")]
    TwoKg,
}

/// Spool restored by a full reset.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct SpoolCfg {
    pub material: MaterialName,
    pub diameter: DiameterName,
    pub roll: RollName,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Wiring {
    /// One half-bridge per motor pole.
    #[default]
    Standard,
    /// Two paralleled half-bridges per pole, for motors above ~0.9 A.
    HighCurrent,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RampCfg {
    pub min_dc: u8,
    pub max_dc: u8,
    pub step_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MotorCfg {
    pub wiring: Wiring,
    /// Do not report open-load alone; the driver flags it on light loads.
    pub ignore_open_load: bool,
    /// Hold time of the extruder pulse fed in automatic mode.
    pub pulse_short_ms: u64,
    /// Hold time of a manual feed/pull pulse.
    pub pulse_long_ms: u64,
    pub extruder: RampCfg,
    pub feed: RampCfg,
    pub load: RampCfg,
}

impl Default for MotorCfg {
    fn default() -> Self {
        Self {
            wiring: Wiring::Standard,
            ignore_open_load: true,
            pulse_short_ms: 100,
            pulse_long_ms: 500,
            extruder: RampCfg {
                min_dc: 40,
                max_dc: 128,
                step_delay_ms: 10,
            },
            feed: RampCfg {
                min_dc: 64,
                max_dc: 255,
                step_delay_ms: 5,
            },
            load: RampCfg {
                min_dc: 64,
                max_dc: 255,
                step_delay_ms: 5,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for HX711 data-ready before failing a conversion
    pub sensor_read_timeout_ms: u64,
    /// Console loop period when no command is pending
    pub poll_interval_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub scale: ScaleCfg,
    pub tracker: TrackerCfg,
    pub spool: SpoolCfg,
    pub motor: MotorCfg,
    pub logging: Logging,
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn validate_ramp(name: &str, r: &RampCfg) -> eyre::Result<()> {
    if r.min_dc > r.max_dc {
        eyre::bail!("motor.{name}.min_dc must be <= max_dc");
    }
    if r.max_dc == 0 {
        eyre::bail!("motor.{name}.max_dc must be > 0");
    }
    if r.step_delay_ms > 1000 {
        eyre::bail!("motor.{name}.step_delay_ms is unreasonably large (>1s)");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scale
        if !(self.scale.calibration_factor.is_finite() && self.scale.calibration_factor > 0.0) {
            eyre::bail!("scale.calibration_factor must be a positive number");
        }
        if self.scale.samples == 0 {
            eyre::bail!("scale.samples must be >= 1");
        }
        if self.scale.calibration_steps == 0 {
            eyre::bail!("scale.calibration_steps must be >= 1");
        }

        // Tracker
        if !(self.tracker.tension_threshold_g.is_finite() && self.tracker.tension_threshold_g > 0.0)
        {
            eyre::bail!("tracker.tension_threshold_g must be a finite number > 0");
        }
        let non_negative = [
            ("max_delta_in_range_g", self.tracker.max_delta_in_range_g),
            ("scale_resolution_g", self.tracker.scale_resolution_g),
            ("motor_group_weight_g", self.tracker.motor_group_weight_g),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                eyre::bail!("tracker.{name} must be a finite number >= 0");
            }
        }

        // Motor
        validate_ramp("extruder", &self.motor.extruder)?;
        validate_ramp("feed", &self.motor.feed)?;
        validate_ramp("load", &self.motor.load)?;
        if self.motor.pulse_short_ms == 0 || self.motor.pulse_long_ms == 0 {
            eyre::bail!("motor pulse durations must be >= 1 ms");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }
        if self.hardware.poll_interval_ms == 0 {
            eyre::bail!("hardware.poll_interval_ms must be >= 1");
        }

        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
