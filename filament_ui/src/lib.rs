#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Text rendering of tracker and motor state for the console and the log.
//!
//! Everything here is a pure function of a snapshot; nothing reads hardware.

use filament_core::{
    CalibrationPhase, CalibrationStep, FaultReport, LengthDisplay, TrackerSnapshot, Units,
    val_optimizer,
};

pub fn fmt_grams(g: f32) -> String {
    format!("{:.1} gr", val_optimizer(g))
}

pub fn fmt_length(l: LengthDisplay) -> String {
    match l {
        LengthDisplay::Centimeters(cm) => format!("{cm:.1} cm"),
        LengthDisplay::Meters(m) => format!("{m:.2} m"),
    }
}

/// Consumption in the unit selected on the tracker.
pub fn fmt_consumed(s: &TrackerSnapshot) -> String {
    match s.units {
        Units::Grams => fmt_grams(s.consumed_g),
        Units::Length => fmt_length(LengthDisplay::from_cm(s.consumed_cm)),
    }
}

pub fn fmt_spool(s: &TrackerSnapshot) -> String {
    format!("{} {} {}", s.material, s.diameter, s.roll)
}

/// `[#####.....]`, clamped to 0..=100 %.
pub fn progress_bar(percent: f32, width: usize) -> String {
    let p = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((p / 100.0) * width as f32).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// One-line status shown after every command.
pub fn status_line(s: &TrackerSnapshot) -> String {
    let mut line = format!(
        "[{}] {} | used {} | left {:.1}% {}",
        s.state,
        fmt_spool(s),
        fmt_consumed(s),
        val_optimizer(s.remaining_percent),
        progress_bar(s.remaining_percent, 10)
    );
    if s.flags.extruder_tension {
        line.push_str(" | tension");
    }
    if let Some(phase) = s.calibration_phase {
        line.push_str(&format!(" | calibrating ({phase})"));
    }
    line
}

/// Multi-line dump of every numeric accessor.
pub fn dump(s: &TrackerSnapshot) -> Vec<String> {
    vec![
        format!("state: {}", s.state),
        format!("spool: {}", fmt_spool(s)),
        format!("last read: {:.2} g", s.last_read),
        format!("prev read: {:.2} g", s.prev_read),
        format!("net weight: {}", fmt_grams(s.net_g)),
        format!("consumed: {}", fmt_grams(s.consumed_g)),
        format!("consumed: {}", fmt_length(LengthDisplay::from_cm(s.consumed_cm))),
        format!("remaining: {:.1}%", val_optimizer(s.remaining_percent)),
        format!("calibration factor: {:.3}", s.calibration_factor),
        format!("units: {}", s.units),
        format!("material changed: {}", s.flags.material_changed),
    ]
}

pub fn fmt_faults(f: FaultReport) -> String {
    if f.is_empty() {
        "driver ok".to_string()
    } else {
        format!("driver fault: {f}")
    }
}

/// Operator instruction after a calibration step.
pub fn calibration_prompt(step: &CalibrationStep) -> String {
    match step {
        CalibrationStep::Tared => {
            "scale tared; place the reference weight and send `calibrate`".to_string()
        }
        CalibrationStep::Measured { raw } => {
            format!("measured {raw:.1} units; send the reference weight in grams")
        }
        CalibrationStep::Completed {
            factor,
            accepted: true,
        } => format!("calibration done, factor {factor:.3}"),
        CalibrationStep::Completed {
            factor,
            accepted: false,
        } => format!("no usable reference weight, factor kept at {factor:.3}"),
    }
}

pub fn phase_name(phase: Option<CalibrationPhase>) -> &'static str {
    match phase {
        None => "idle",
        Some(CalibrationPhase::Tare) => "tare",
        Some(CalibrationPhase::Measure) => "measure",
        Some(CalibrationPhase::Compute) => "compute",
    }
}
