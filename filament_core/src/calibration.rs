//! Three-phase scale calibration.
//!
//! 1. `Tare`: unit factor, re-tare with the scale empty.
//! 2. `Measure`: average `steps` readings with the reference weight on the scale.
//! 3. `Compute`: `factor = raw / reference_g`.
//!
//! A phase that fails on a read error does not advance; calling it again
//! retries the same phase.

use crate::error::Result;
use crate::scale::ScaleChannel;
use filament_traits::LoadCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CalibrationPhase {
    Tare,
    Measure,
    Compute,
}

/// What one `calibrate` call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    Tared,
    Measured { raw: f32 },
    /// `accepted` is false when the factor could not be computed and the
    /// previous one was kept.
    Completed { factor: f32, accepted: bool },
}

impl CalibrationStep {
    pub fn is_complete(&self) -> bool {
        matches!(self, CalibrationStep::Completed { .. })
    }
}

/// In-flight calibration; dropped by the tracker once `Compute` has run.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    phase: CalibrationPhase,
    raw: f32,
    previous_factor: f32,
}

/// `raw / reference_g`, or `None` when that is not a usable factor.
pub fn compute_factor(raw: f32, reference_g: f32) -> Option<f32> {
    let f = raw / reference_g;
    (f.is_finite() && f > 0.0).then_some(f)
}

impl CalibrationSession {
    pub fn new(previous_factor: f32) -> Self {
        Self {
            phase: CalibrationPhase::Tare,
            raw: 0.0,
            previous_factor,
        }
    }

    /// Phase the next call will run.
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Raw units measured in phase 2 (0 before that).
    pub fn raw(&self) -> f32 {
        self.raw
    }

    /// Run the pending phase. `reference_g` is only read by `Compute`; a
    /// missing value counts as zero.
    pub fn advance<L: LoadCell>(
        &mut self,
        scale: &mut ScaleChannel<L>,
        samples: u8,
        steps: u8,
        reference_g: Option<f32>,
    ) -> Result<CalibrationStep> {
        match self.phase {
            CalibrationPhase::Tare => {
                scale.set_factor(1.0);
                scale.tare(samples)?;
                self.phase = CalibrationPhase::Measure;
                tracing::info!("calibration: scale tared, place the reference weight");
                Ok(CalibrationStep::Tared)
            }
            CalibrationPhase::Measure => {
                self.raw = scale.read_units(steps)?;
                self.phase = CalibrationPhase::Compute;
                tracing::info!(raw = self.raw, "calibration: reference measured");
                Ok(CalibrationStep::Measured { raw: self.raw })
            }
            CalibrationPhase::Compute => {
                let reference = reference_g.unwrap_or(0.0);
                match compute_factor(self.raw, reference) {
                    Some(factor) => {
                        tracing::info!(factor, reference, "calibration complete");
                        Ok(CalibrationStep::Completed {
                            factor,
                            accepted: true,
                        })
                    }
                    None => {
                        tracing::warn!(
                            raw = self.raw,
                            reference,
                            kept = self.previous_factor,
                            "calibration factor rejected, keeping previous"
                        );
                        Ok(CalibrationStep::Completed {
                            factor: self.previous_factor,
                            accepted: false,
                        })
                    }
                }
            }
        }
    }
}
