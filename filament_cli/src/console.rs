//! Command console: dispatches parsed commands to the tracker and the motor,
//! then polls the tracker and samples driver faults once per loop turn.

use crate::commands::{self, Command, HELP};
use crate::error_fmt;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use eyre::{Result, WrapErr};
use filament_core::{
    CalibrationPhase, Diameter, MotorRamp, RunSummary, TrackerState, WeightTracker,
};
use filament_hardware::LoadCellHandle;
use filament_traits::{LoadCell, MotorDriver};
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    /// Feed the extruder whenever the tracker reports tension.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<L: LoadCell, D: MotorDriver, W: Write> {
    tracker: WeightTracker<L>,
    motor: MotorRamp<D>,
    mode: Mode,
    sim: Option<LoadCellHandle>,
    json: bool,
    out: W,
}

impl<L: LoadCell, D: MotorDriver, W: Write> Console<L, D, W> {
    pub fn new(
        tracker: WeightTracker<L>,
        motor: MotorRamp<D>,
        sim: Option<LoadCellHandle>,
        json: bool,
        out: W,
    ) -> Self {
        Self {
            tracker,
            motor,
            mode: Mode::Manual,
            sim,
            json,
            out,
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn begin(&mut self) -> Result<()> {
        self.tracker.begin()?;
        self.motor.begin()?;
        Ok(())
    }

    fn say(&mut self, event: &str, text: &str) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", json!({ "event": event, "message": text }))?;
        } else {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let s = self.tracker.snapshot();
        if self.json {
            let line = json!({
                "event": "status",
                "state": s.state.to_string(),
                "mode": if self.mode == Mode::Auto { "auto" } else { "manual" },
                "material": s.material,
                "diameter": s.diameter,
                "roll": s.roll,
                "units": s.units.to_string(),
                "last_read_g": s.last_read,
                "prev_read_g": s.prev_read,
                "net_g": s.net_g,
                "consumed_g": s.consumed_g,
                "consumed_cm": s.consumed_cm,
                "remaining_percent": s.remaining_percent,
                "calibration_factor": s.calibration_factor,
                "calibration_phase": filament_ui::phase_name(s.calibration_phase),
                "extruder_tension": s.flags.extruder_tension,
                "material_changed": s.flags.material_changed,
                "motor": self.motor.phase().to_string(),
                "duty": self.motor.duty(),
            });
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(self.out, "{}", filament_ui::status_line(&s))?;
        }
        Ok(())
    }

    fn print_run(&mut self, what: &str, summary: RunSummary) -> Result<()> {
        if summary.faults.is_empty() {
            self.say("motor", what)
        } else {
            let text = format!("{what} ({})", filament_ui::fmt_faults(summary.faults));
            self.say("fault", &text)
        }
    }

    pub fn dispatch(&mut self, cmd: Command) -> Result<Flow> {
        tracing::debug!(?cmd, "command");
        match cmd {
            Command::Reset => {
                let mounted = self.tracker.spool().selection();
                self.tracker.reset_with(mounted)?;
                self.print_status()?;
            }
            Command::Default => {
                self.tracker.reset()?;
                self.print_status()?;
            }
            Command::Load => {
                self.tracker.set_state(TrackerState::Load);
                self.print_status()?;
            }
            Command::Run => {
                self.tracker.set_state(TrackerState::Run);
                self.print_status()?;
            }
            Command::Auto => {
                self.mode = Mode::Auto;
                self.say("mode", "automatic mode")?;
            }
            Command::Manual => {
                self.mode = Mode::Manual;
                self.say("mode", "manual mode")?;
            }
            Command::Material(m) => self.tracker.set_material(m),
            Command::Roll(r) => self.tracker.set_roll(r),
            Command::Units(u) => {
                self.tracker.set_units(u);
                self.print_status()?;
            }
            Command::Feed => {
                let hold = self.motor.config().pulse_long;
                let summary = self.motor.filament_feed(hold)?;
                self.print_run("fed", summary)?;
            }
            Command::Pull => {
                let hold = self.motor.config().pulse_long;
                let summary = self.motor.filament_load(hold)?;
                self.print_run("pulled", summary)?;
            }
            Command::Stop => {
                let summary = self.motor.brake()?;
                self.print_run("stopped", summary)?;
            }
            Command::FeedContinuous => {
                let summary = self.motor.feed_continuous()?;
                self.print_run("feeding", summary)?;
            }
            Command::PullContinuous => {
                let summary = self.motor.load_continuous()?;
                self.print_run("pulling", summary)?;
            }
            Command::Calibrate(Some(v))
                if self.tracker.calibration_phase() != Some(CalibrationPhase::Compute) =>
            {
                eyre::bail!(
                    "`calibrate {v}`: the reference weight is read in the last step only; \
                     send `calibrate` until the scale asks for it"
                );
            }
            Command::Calibrate(reference) => self.calibrate(reference)?,
            Command::Number(v) => {
                if self.tracker.calibration_phase() == Some(CalibrationPhase::Compute) {
                    self.calibrate(Some(v))?;
                } else if v == 1.75 {
                    self.tracker.set_diameter(Diameter::D175);
                } else if v == 3.0 {
                    self.tracker.set_diameter(Diameter::D300);
                } else {
                    eyre::bail!(
                        "`{v}` is neither a diameter (1.75, 3.00) nor a reference weight; \
                         no calibration is waiting for one"
                    );
                }
            }
            Command::Config => self.print_config()?,
            Command::Status => self.print_status()?,
            Command::Dump => {
                let s = self.tracker.snapshot();
                if self.json {
                    let lines = filament_ui::dump(&s);
                    writeln!(self.out, "{}", json!({ "event": "dump", "lines": lines }))?;
                } else {
                    for line in filament_ui::dump(&s) {
                        writeln!(self.out, "{line}")?;
                    }
                }
            }
            Command::Weight => {
                let w = self.tracker.read_weight()?;
                let text = format!("weight: {}", filament_ui::fmt_grams(w));
                self.say("weight", &text)?;
            }
            Command::Faults => {
                let faults = self.motor.read_faults()?;
                let text = filament_ui::fmt_faults(faults);
                self.say("faults", &text)?;
            }
            Command::Sim(grams) => {
                let Some(handle) = &self.sim else {
                    eyre::bail!("`sim` needs the simulated load cell");
                };
                handle.set_grams(grams);
            }
            Command::Help => {
                for line in HELP.lines() {
                    self.say("help", line)?;
                }
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn calibrate(&mut self, reference: Option<f32>) -> Result<()> {
        let step = self.tracker.calibrate(reference)?;
        let text = filament_ui::calibration_prompt(&step);
        self.say("calibration", &text)?;
        if step.is_complete() {
            self.print_status()?;
        }
        Ok(())
    }

    fn print_config(&mut self) -> Result<()> {
        let spool = *self.tracker.spool();
        let t = self.tracker.config().clone();
        let m = self.motor.config().clone();
        let lines = [
            format!(
                "spool: {} {} {} ({} g/cm, tare {} g)",
                spool.material(),
                spool.diameter(),
                spool.roll(),
                spool.grams_per_cm(),
                spool.tare_g()
            ),
            format!("calibration factor: {}", self.tracker.calibration_factor()),
            format!(
                "tension threshold: {} g, load window: {} g, resolution: {} g",
                t.thresholds.tension_g, t.thresholds.max_delta_in_range_g, t.scale_resolution_g
            ),
            format!(
                "motor: {} wiring, ignore open load: {}",
                m.wiring, m.ignore_open_load
            ),
            format!(
                "ramps: extruder {}..{}, feed {}..{}, load {}..{}",
                m.extruder.min_dc,
                m.extruder.max_dc,
                m.feed.min_dc,
                m.feed.max_dc,
                m.load.min_dc,
                m.load.max_dc
            ),
        ];
        for line in &lines {
            self.say("config", line)?;
        }
        Ok(())
    }

    /// Poll the tracker and sample the driver once.
    pub fn tick(&mut self) -> Result<()> {
        let sample = self.tracker.poll().wrap_err("poll tracker")?;
        let faults = self.motor.read_faults()?;
        if !faults.is_empty() {
            let text = filament_ui::fmt_faults(faults);
            self.say("fault", &text)?;
        }
        if self.tracker.material_changed() {
            self.tracker.acknowledge_material_change();
            let s = self.tracker.snapshot();
            let text = format!("spool: {}", filament_ui::fmt_spool(&s));
            self.say("spool", &text)?;
        }
        if self.mode == Mode::Auto
            && sample.state == TrackerState::Run
            && sample.extruder_tension
            && !self.motor.is_running()
        {
            let hold = self.motor.config().pulse_short;
            let summary = self.motor.feed_extruder(hold)?;
            self.print_run("auto: extruder pulse", summary)?;
        }
        Ok(())
    }

    fn report(&mut self, err: &eyre::Report) -> Result<()> {
        tracing::warn!(error = %format!("{err:#}"), "command failed");
        if self.json {
            writeln!(self.out, "{}", error_fmt::format_error_json(err))?;
        } else {
            eprintln!("error: {}", error_fmt::humanize(err));
        }
        Ok(())
    }

    /// Brake the motor before leaving.
    pub fn shutdown(&mut self) -> Result<()> {
        self.motor.brake().wrap_err("brake on shutdown")?;
        self.out.flush()?;
        Ok(())
    }

    /// Run until `quit`, end of input or `stop_flag`.
    pub fn run(
        &mut self,
        lines: &Receiver<String>,
        stop_flag: &AtomicBool,
        poll_interval: Duration,
    ) -> Result<()> {
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                tracing::warn!("interrupted, braking");
                break;
            }
            match lines.recv_timeout(poll_interval) {
                Ok(line) if line.trim().is_empty() => {}
                Ok(line) => match commands::parse(&line) {
                    Ok(cmd) => match self.dispatch(cmd) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => self.report(&e)?,
                    },
                    Err(e) => self.report(&eyre::Report::new(e))?,
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if let Err(e) = self.tick() {
                self.report(&e)?;
            }
            self.out.flush()?;
        }
        self.shutdown()
    }
}
