//! Averaged, tared and scaled view of a raw load cell.
//!
//! `units = sign * (mean(raw) - offset) / factor`. The sign is negative when
//! the cell is mounted upside down, so more filament always reads heavier.

use crate::error::Result;
use crate::hw_error;
use eyre::WrapErr;
use filament_traits::LoadCell;
use std::time::Duration;

pub struct ScaleChannel<L: LoadCell> {
    cell: L,
    offset: f64,
    factor: f32,
    invert: bool,
    timeout: Duration,
}

impl<L: LoadCell> ScaleChannel<L> {
    pub fn new(cell: L, factor: f32, invert: bool, timeout: Duration) -> Self {
        Self {
            cell,
            offset: 0.0,
            factor,
            invert,
            timeout,
        }
    }

    /// Mean of `times` raw conversions (at least one).
    pub fn read_average(&mut self, times: u8) -> Result<f64> {
        let n = times.max(1);
        let mut sum = 0i64;
        for _ in 0..n {
            let raw = self
                .cell
                .read(self.timeout)
                .map_err(|e| hw_error::report(&e))
                .wrap_err("load cell read")?;
            sum += i64::from(raw);
        }
        let avg = sum as f64 / f64::from(n);
        tracing::trace!(raw = avg, samples = n, "scale average");
        Ok(avg)
    }

    /// Take the current load as zero.
    pub fn tare(&mut self, times: u8) -> Result<()> {
        self.offset = self.read_average(times)?;
        tracing::debug!(offset = self.offset, "scale tared");
        Ok(())
    }

    /// Sign-corrected weight in scale units.
    pub fn read_units(&mut self, times: u8) -> Result<f32> {
        let value = self.read_average(times)? - self.offset;
        let sign = if self.invert { -1.0 } else { 1.0 };
        Ok((sign * value / f64::from(self.factor)) as f32)
    }

    pub fn set_factor(&mut self, factor: f32) {
        self.factor = factor;
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}
