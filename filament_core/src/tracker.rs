//! Weight tracker: status machine, filtered readings, consumption accounting
//! and calibration.
//!
//! One `poll()` per control-loop tick reads the averaged weight, runs it
//! through [`filter`](crate::filter::filter) for the current state and, in
//! `Run`, updates the consumed filament. Accessors never touch the sensor.

use crate::calibration::{CalibrationPhase, CalibrationSession, CalibrationStep};
use crate::config::TrackerCfg;
use crate::error::{BuildError, Result};
use crate::filter::filter;
use crate::scale::ScaleChannel;
use crate::spool::{Diameter, FilamentSpool, Material, RollSize, SpoolSelection};
use crate::status::{TrackerFlags, TrackerState, WeightSample};
use crate::util::{LengthDisplay, Units};
use eyre::WrapErr;
use filament_traits::LoadCell;

/// Filament left on the roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remaining {
    pub net_g: f32,
    pub length: LengthDisplay,
    pub percent: f32,
}

/// Everything the display layer shows, read in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub material: &'static str,
    pub diameter: &'static str,
    pub roll: &'static str,
    pub units: Units,
    pub last_read: f32,
    pub prev_read: f32,
    pub net_g: f32,
    pub consumed_g: f32,
    pub consumed_cm: f32,
    pub remaining_percent: f32,
    pub calibration_factor: f32,
    pub calibration_phase: Option<CalibrationPhase>,
    pub flags: TrackerFlags,
}

pub struct WeightTracker<L: LoadCell> {
    scale: ScaleChannel<L>,
    cfg: TrackerCfg,
    state: TrackerState,
    spool: FilamentSpool,
    units: Units,
    calibration_factor: f32,
    session: Option<CalibrationSession>,
    prev_read: f32,
    last_read: f32,
    initial_weight: f32,
    consumed_g: f32,
    flags: TrackerFlags,
}

impl<L: LoadCell> WeightTracker<L> {
    /// Build an uninitialised tracker (state `None`); call `begin()` next.
    pub fn new(cell: L, cfg: TrackerCfg) -> std::result::Result<Self, BuildError> {
        if !(cfg.calibration_factor.is_finite() && cfg.calibration_factor > 0.0) {
            return Err(BuildError::InvalidConfig(
                "calibration_factor must be a positive number",
            ));
        }
        if cfg.samples == 0 || cfg.calibration_steps == 0 {
            return Err(BuildError::InvalidConfig("sample counts must be >= 1"));
        }
        let t = cfg.thresholds;
        if !(t.tension_g.is_finite() && t.tension_g > 0.0) {
            return Err(BuildError::InvalidConfig("tension threshold must be > 0"));
        }
        let non_negative = [t.max_delta_in_range_g, cfg.scale_resolution_g, cfg.motor_group_g];
        if !non_negative.iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(BuildError::InvalidConfig(
                "filter thresholds and motor group weight must be finite and non-negative",
            ));
        }
        let spool = FilamentSpool::new(cfg.default_spool, cfg.motor_group_g);
        Ok(Self {
            scale: ScaleChannel::new(cell, cfg.calibration_factor, cfg.invert, cfg.sensor_timeout),
            calibration_factor: cfg.calibration_factor,
            cfg,
            state: TrackerState::None,
            spool,
            units: Units::Grams,
            session: None,
            prev_read: 0.0,
            last_read: 0.0,
            initial_weight: 0.0,
            consumed_g: 0.0,
            flags: TrackerFlags::default(),
        })
    }

    /// Apply the configured factor and perform a full reset.
    pub fn begin(&mut self) -> Result<()> {
        self.calibration_factor = self.cfg.calibration_factor;
        self.reset().wrap_err("tracker begin")
    }

    /// Re-tare at the stored factor, restore the default spool, enter `Ready`.
    pub fn reset(&mut self) -> Result<()> {
        self.restart(FilamentSpool::new(
            self.cfg.default_spool,
            self.cfg.motor_group_g,
        ))
    }

    /// Like `reset()` but mounts `selection` instead of the default spool.
    pub fn reset_with(&mut self, selection: SpoolSelection) -> Result<()> {
        self.restart(FilamentSpool::new(selection, self.cfg.motor_group_g))
    }

    fn restart(&mut self, spool: FilamentSpool) -> Result<()> {
        self.session = None;
        self.scale.set_factor(self.calibration_factor);
        self.scale.tare(self.cfg.samples).wrap_err("tare on reset")?;
        self.replace_spool(spool);
        self.prev_read = 0.0;
        self.last_read = 0.0;
        self.initial_weight = 0.0;
        self.consumed_g = 0.0;
        self.units = Units::Grams;
        self.flags.extruder_tension = false;
        self.state = TrackerState::Ready;
        tracing::info!(
            state = %self.state,
            factor = self.calibration_factor,
            material = %self.spool.material(),
            diameter = %self.spool.diameter(),
            roll = %self.spool.roll(),
            "tracker reset"
        );
        Ok(())
    }

    fn replace_spool(&mut self, spool: FilamentSpool) {
        if spool != self.spool {
            self.flags.material_changed = true;
            tracing::debug!(
                material = %spool.material(),
                diameter = %spool.diameter(),
                roll = %spool.roll(),
                "spool changed"
            );
        }
        self.spool = spool;
    }

    /// Change status. Entering `Run` starts a job: the current net weight
    /// becomes the initial weight and consumption restarts from zero.
    pub fn set_state(&mut self, state: TrackerState) {
        if state == TrackerState::Run {
            self.initial_weight = self.net_weight();
            self.consumed_g = 0.0;
        }
        self.prev_read = self.last_read;
        self.flags.extruder_tension = false;
        self.state = state;
        tracing::info!(state = %state, initial = self.initial_weight, "tracker state");
    }

    pub fn set_material(&mut self, material: Material) {
        self.replace_spool(self.spool.with_material(material));
    }

    pub fn set_diameter(&mut self, diameter: Diameter) {
        self.replace_spool(self.spool.with_diameter(diameter));
    }

    pub fn set_roll(&mut self, roll: RollSize) {
        self.replace_spool(self.spool.with_roll(roll));
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    /// Read, filter and account one sample.
    ///
    /// While a calibration session is open the scale runs at unit factor, so
    /// the tracker does not read it and returns the last sample unchanged.
    pub fn poll(&mut self) -> Result<WeightSample> {
        if self.session.is_some() {
            return Ok(self.sample());
        }
        let cur = match self.state {
            TrackerState::None => 0.0,
            _ => self.scale.read_units(self.cfg.samples)?,
        };
        let out = filter(self.state, self.prev_read, cur, &self.cfg.thresholds);
        self.prev_read = out.prev;
        self.last_read = out.last;
        self.flags.extruder_tension = out.extruder_tension;

        if out.extruder_tension {
            tracing::debug!(prev = out.prev, last = out.last, "extruder tension");
        } else if self.state == TrackerState::Run {
            self.account();
        }
        Ok(self.sample())
    }

    fn account(&mut self) {
        if self.initial_weight == 0.0 {
            return;
        }
        let consumed = self.initial_weight - self.net_weight();
        if consumed >= self.cfg.scale_resolution_g {
            self.consumed_g = consumed;
        } else {
            tracing::trace!(consumed, kept = self.consumed_g, "consumption below resolution");
        }
    }

    fn sample(&self) -> WeightSample {
        WeightSample {
            state: self.state,
            last_read: self.last_read,
            prev_read: self.prev_read,
            extruder_tension: self.flags.extruder_tension,
        }
    }

    /// Advance the calibration session, opening one if needed.
    ///
    /// `reference_g` is only used by the third call. Completing the session
    /// stores the new factor and performs a full `reset()`.
    pub fn calibrate(&mut self, reference_g: Option<f32>) -> Result<CalibrationStep> {
        let (samples, steps) = (self.cfg.samples, self.cfg.calibration_steps);
        let previous = self.calibration_factor;
        let session = self
            .session
            .get_or_insert_with(|| CalibrationSession::new(previous));
        let step = session
            .advance(&mut self.scale, samples, steps, reference_g)
            .wrap_err("calibration")?;
        if let CalibrationStep::Completed { factor, .. } = step {
            self.calibration_factor = factor;
            self.reset()?;
        }
        Ok(step)
    }

    /// Drop an in-flight calibration and restore the stored factor.
    /// Returns whether a session was open.
    pub fn cancel_calibration(&mut self) -> bool {
        if self.session.take().is_some() {
            self.scale.set_factor(self.calibration_factor);
            tracing::info!("calibration cancelled");
            true
        } else {
            false
        }
    }

    /// One sign-corrected reading that leaves the tracker state alone.
    pub fn read_weight(&mut self) -> Result<f32> {
        self.scale.read_units(self.cfg.samples)
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }
    pub fn flags(&self) -> TrackerFlags {
        self.flags
    }
    pub fn extruder_tension_detected(&self) -> bool {
        self.flags.extruder_tension
    }
    pub fn material_changed(&self) -> bool {
        self.flags.material_changed
    }
    pub fn acknowledge_material_change(&mut self) {
        self.flags.material_changed = false;
    }
    pub fn spool(&self) -> &FilamentSpool {
        &self.spool
    }
    pub fn units(&self) -> Units {
        self.units
    }
    pub fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }
    pub fn calibration_phase(&self) -> Option<CalibrationPhase> {
        self.session.as_ref().map(CalibrationSession::phase)
    }
    pub fn last_read(&self) -> f32 {
        self.last_read
    }
    pub fn prev_read(&self) -> f32 {
        self.prev_read
    }
    pub fn initial_weight(&self) -> f32 {
        self.initial_weight
    }

    /// `last_read - tare`.
    pub fn net_weight(&self) -> f32 {
        self.last_read - self.spool.tare_g()
    }

    /// Last published consumption in grams.
    pub fn consumed_grams(&self) -> f32 {
        self.consumed_g
    }

    pub fn consumed_centimeters(&self) -> f32 {
        self.spool.grams_to_cm(self.consumed_g)
    }

    pub fn consumed_length(&self) -> LengthDisplay {
        LengthDisplay::from_cm(self.consumed_centimeters())
    }

    pub fn remaining_percent(&self, net_weight_g: f32) -> f32 {
        self.spool.remaining_percent(net_weight_g)
    }

    pub fn remaining(&self) -> Remaining {
        let net = self.net_weight();
        Remaining {
            net_g: net,
            length: LengthDisplay::from_cm(self.spool.grams_to_cm(net)),
            percent: self.remaining_percent(net),
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let net = self.net_weight();
        TrackerSnapshot {
            state: self.state,
            material: self.spool.material().into(),
            diameter: self.spool.diameter().into(),
            roll: self.spool.roll().into(),
            units: self.units,
            last_read: self.last_read,
            prev_read: self.prev_read,
            net_g: net,
            consumed_g: self.consumed_g,
            consumed_cm: self.consumed_centimeters(),
            remaining_percent: self.remaining_percent(net),
            calibration_factor: self.calibration_factor,
            calibration_phase: self.calibration_phase(),
            flags: self.flags,
        }
    }

    pub fn config(&self) -> &TrackerCfg {
        &self.cfg
    }
}
