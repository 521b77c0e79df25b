//! DC motor ramp controller.
//!
//! Drives one motor through accelerate → steady → decelerate → brake on a
//! multi half-bridge driver. Duty changes by one unit per step and every step
//! samples the driver diagnosis.
//!
//! `run_timed` blocks for the whole profile: nothing else runs until the
//! motor is braked again. Continuous runs return after the ramp up and are
//! stopped by a later `brake()`.

use crate::config::{MotorCfg, RampProfile, Wiring};
use crate::error::Result;
use crate::fault::FaultReport;
use crate::hw_error;
use eyre::WrapErr;
use filament_traits::{BridgeOutput, Clock, HalfBridge, MonotonicClock, MotorDriver, PwmChannel};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr)]
pub enum RampPhase {
    #[default]
    Idle,
    Accelerating,
    Steady,
    Decelerating,
    Braking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr)]
pub enum Direction {
    /// Push filament toward the extruder.
    #[default]
    #[strum(serialize = "feed")]
    Feed,
    /// Pull filament back onto the roll.
    #[strum(serialize = "load")]
    Load,
}

/// Outcome of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Every fault surfaced while ramping.
    pub faults: FaultReport,
    /// Duty writes performed.
    pub steps: u32,
}

const STANDARD_A: &[HalfBridge] = &[HalfBridge::Hb1];
const STANDARD_B: &[HalfBridge] = &[HalfBridge::Hb2];
const HIGH_CURRENT_A: &[HalfBridge] = &[HalfBridge::Hb1, HalfBridge::Hb2];
const HIGH_CURRENT_B: &[HalfBridge] = &[HalfBridge::Hb3, HalfBridge::Hb4];

/// Half-bridges wired to pole A and pole B.
pub fn poles(wiring: Wiring) -> (&'static [HalfBridge], &'static [HalfBridge]) {
    match wiring {
        Wiring::Standard => (STANDARD_A, STANDARD_B),
        Wiring::HighCurrent => (HIGH_CURRENT_A, HIGH_CURRENT_B),
    }
}

pub struct MotorRamp<D: MotorDriver> {
    driver: D,
    cfg: MotorCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    phase: RampPhase,
    direction: Direction,
    duty: u8,
    /// Profile and direction of a continuous run awaiting `brake()`.
    active: Option<(RampProfile, Direction)>,
    last_faults: FaultReport,
}

impl<D: MotorDriver> MotorRamp<D> {
    pub fn new(driver: D, cfg: MotorCfg) -> std::result::Result<Self, crate::error::BuildError> {
        cfg.validate()?;
        Ok(Self {
            driver,
            cfg,
            clock: Arc::new(MonotonicClock::new()),
            phase: RampPhase::Idle,
            direction: Direction::Feed,
            duty: 0,
            active: None,
            last_faults: FaultReport::empty(),
        })
    }

    /// Swap the clock used for step delays and holds.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Arc::from(clock);
        self
    }

    /// Float the half-bridges the wiring does not use, clear stale driver
    /// errors and leave the motor coasting.
    pub fn begin(&mut self) -> Result<()> {
        let (a, b) = poles(self.cfg.wiring);
        for hb in HalfBridge::ALL {
            if !a.contains(&hb) && !b.contains(&hb) {
                self.configure(hb, BridgeOutput::Floating, PwmChannel::None)?;
            }
        }
        self.driver
            .clear_errors()
            .map_err(|e| hw_error::report(&e))
            .wrap_err("clear driver errors")?;
        self.coast()?;
        tracing::info!(wiring = %self.cfg.wiring, "motor driver ready");
        Ok(())
    }

    /// Ramp up, hold, ramp down and brake. Blocks until braked.
    ///
    /// A running continuous ramp is braked first. On a driver error the
    /// motor is braked (best effort) and the error returned.
    pub fn run_timed(
        &mut self,
        profile: RampProfile,
        hold: Duration,
        direction: Direction,
    ) -> Result<RunSummary> {
        profile.validate()?;
        // Faults seen while braking a continuous run belong to this run.
        let mut summary = if self.is_running() {
            self.brake()?
        } else {
            RunSummary::default()
        };
        tracing::debug!(%direction, min = profile.min_dc, max = profile.max_dc, ?hold, "timed run");
        match self.timed_body(profile, hold, direction, &mut summary) {
            Ok(()) => {
                self.assert_brake()?;
                Ok(summary)
            }
            Err(e) => {
                self.brake_after_error();
                Err(e)
            }
        }
    }

    fn timed_body(
        &mut self,
        profile: RampProfile,
        hold: Duration,
        direction: Direction,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.set_direction(direction)?;
        self.ramp_up(profile, summary)?;
        self.phase = RampPhase::Steady;
        self.sample_faults(summary)?;
        self.clock.sleep(hold);
        self.ramp_down(profile, summary)
    }

    /// Ramp up to `max_dc` and stay there until `brake()`.
    pub fn start_continuous(
        &mut self,
        profile: RampProfile,
        direction: Direction,
    ) -> Result<RunSummary> {
        profile.validate()?;
        let mut summary = if self.is_running() {
            self.brake()?
        } else {
            RunSummary::default()
        };
        tracing::debug!(%direction, min = profile.min_dc, max = profile.max_dc, "continuous run");
        let started = self
            .set_direction(direction)
            .and_then(|()| self.ramp_up(profile, &mut summary));
        match started {
            Ok(()) => {
                self.phase = RampPhase::Steady;
                self.active = Some((profile, direction));
                Ok(summary)
            }
            Err(e) => {
                self.brake_after_error();
                Err(e)
            }
        }
    }

    /// Stop the motor. A continuous run ramps down through the bounds it was
    /// started with; an idle motor just gets its brake outputs asserted.
    pub fn brake(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if let Some((profile, _)) = self.active.take() {
            if let Err(e) = self.ramp_down(profile, &mut summary) {
                self.brake_after_error();
                return Err(e);
            }
        }
        self.assert_brake()?;
        Ok(summary)
    }

    /// PWM to zero and both legs floating; the motor spins down freely.
    pub fn coast(&mut self) -> Result<()> {
        self.write_duty(0)?;
        let (a, b) = poles(self.cfg.wiring);
        for hb in a.iter().chain(b) {
            self.configure(*hb, BridgeOutput::Floating, PwmChannel::None)?;
        }
        self.active = None;
        self.phase = RampPhase::Idle;
        Ok(())
    }

    /// Short extruder pulse.
    pub fn feed_extruder(&mut self, hold: Duration) -> Result<RunSummary> {
        self.run_timed(self.cfg.extruder, hold, Direction::Feed)
    }

    pub fn filament_feed(&mut self, hold: Duration) -> Result<RunSummary> {
        self.run_timed(self.cfg.feed, hold, Direction::Feed)
    }

    pub fn filament_load(&mut self, hold: Duration) -> Result<RunSummary> {
        self.run_timed(self.cfg.load, hold, Direction::Load)
    }

    pub fn feed_continuous(&mut self) -> Result<RunSummary> {
        self.start_continuous(self.cfg.feed, Direction::Feed)
    }

    pub fn load_continuous(&mut self) -> Result<RunSummary> {
        self.start_continuous(self.cfg.load, Direction::Load)
    }

    /// Read and decode the diagnosis register.
    ///
    /// Returns the faults left after the open-load policy. A non-zero
    /// register is cleared on the driver after it has been read; nothing is
    /// retried.
    pub fn read_faults(&mut self) -> Result<FaultReport> {
        let reg = self
            .driver
            .diagnosis()
            .map_err(|e| hw_error::report(&e))
            .wrap_err("read driver diagnosis")?;
        let surfaced = FaultReport::from_register(reg).surfaced(self.cfg.ignore_open_load);
        if !surfaced.is_empty() {
            tracing::warn!(faults = %surfaced, raw = reg.0, duty = self.duty, "motor driver fault");
        }
        if !reg.is_ok() {
            self.driver
                .clear_errors()
                .map_err(|e| hw_error::report(&e))
                .wrap_err("clear driver errors")?;
        }
        self.last_faults = surfaced;
        Ok(surfaced)
    }

    fn sample_faults(&mut self, summary: &mut RunSummary) -> Result<()> {
        let faults = self.read_faults()?;
        summary.faults = summary.faults.union(faults);
        Ok(())
    }

    fn ramp_up(&mut self, profile: RampProfile, summary: &mut RunSummary) -> Result<()> {
        self.phase = RampPhase::Accelerating;
        for dc in profile.min_dc..=profile.max_dc {
            self.step(dc, profile.step_delay, summary)?;
        }
        Ok(())
    }

    fn ramp_down(&mut self, profile: RampProfile, summary: &mut RunSummary) -> Result<()> {
        self.phase = RampPhase::Decelerating;
        for dc in (profile.min_dc..profile.max_dc).rev() {
            self.step(dc, profile.step_delay, summary)?;
        }
        Ok(())
    }

    fn step(&mut self, dc: u8, delay: Duration, summary: &mut RunSummary) -> Result<()> {
        self.write_duty(dc)?;
        summary.steps += 1;
        self.sample_faults(summary)?;
        self.clock.sleep(delay);
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        let (a, b) = poles(self.cfg.wiring);
        let (driven, grounded) = match direction {
            Direction::Feed => (a, b),
            Direction::Load => (b, a),
        };
        for hb in driven {
            self.configure(*hb, BridgeOutput::High, PwmChannel::Pwm1)?;
        }
        for hb in grounded {
            self.configure(*hb, BridgeOutput::Low, PwmChannel::None)?;
        }
        self.direction = direction;
        Ok(())
    }

    /// Both legs high: the motor windings are shorted and the rotor stops.
    fn assert_brake(&mut self) -> Result<()> {
        let (a, b) = poles(self.cfg.wiring);
        for hb in a.iter().chain(b) {
            self.configure(*hb, BridgeOutput::High, PwmChannel::None)?;
        }
        self.duty = 0;
        self.active = None;
        self.phase = RampPhase::Braking;
        tracing::debug!("motor braked");
        Ok(())
    }

    fn brake_after_error(&mut self) {
        if let Err(e) = self.assert_brake() {
            tracing::warn!(error = %e, "brake after driver error failed");
        }
    }

    fn configure(&mut self, hb: HalfBridge, out: BridgeOutput, pwm: PwmChannel) -> Result<()> {
        self.driver
            .configure(hb, out, pwm)
            .map_err(|e| hw_error::report(&e))
            .wrap_err_with(|| format!("configure {hb:?}"))
    }

    fn write_duty(&mut self, duty: u8) -> Result<()> {
        self.driver
            .set_duty(duty)
            .map_err(|e| hw_error::report(&e))
            .wrap_err("set duty cycle")?;
        self.duty = duty;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
            || matches!(
                self.phase,
                RampPhase::Accelerating | RampPhase::Steady | RampPhase::Decelerating
            )
    }
    pub fn phase(&self) -> RampPhase {
        self.phase
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn duty(&self) -> u8 {
        self.duty
    }
    pub fn last_faults(&self) -> FaultReport {
        self.last_faults
    }
    pub fn config(&self) -> &MotorCfg {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_poles() {
        assert_eq!(poles(Wiring::Standard).0, &[HalfBridge::Hb1]);
        assert_eq!(
            poles(Wiring::HighCurrent).1,
            &[HalfBridge::Hb3, HalfBridge::Hb4]
        );
    }
}
