//! Load-cell and motor-driver backends.
//!
//! The simulated backends share their state through `Rc` handles so a test or
//! the console can change the weight on the scale or inject driver faults
//! while the core owns the device itself.
pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod hx711;

use filament_traits::{
    BoxError, BridgeOutput, DiagRegister, HalfBridge, LoadCell, MotorDriver, PwmChannel,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Raw counts per gram of the simulated cell; matches the factory factor.
pub const SIM_COUNTS_PER_GRAM: f32 = 434.5;

/// Simulated HX711 with a load cell mounted upside down: more weight gives
/// lower counts, as on the dispenser frame.
pub struct SimulatedLoadCell {
    grams: Rc<Cell<f32>>,
    zero_counts: i32,
    counts_per_gram: f32,
}

/// Handle used to put weight on a [`SimulatedLoadCell`].
#[derive(Clone)]
pub struct LoadCellHandle {
    grams: Rc<Cell<f32>>,
}

impl LoadCellHandle {
    pub fn set_grams(&self, grams: f32) {
        self.grams.set(grams);
    }

    pub fn grams(&self) -> f32 {
        self.grams.get()
    }
}

impl SimulatedLoadCell {
    pub fn new() -> Self {
        Self::with_zero(84_291)
    }

    pub fn with_zero(zero_counts: i32) -> Self {
        Self {
            grams: Rc::new(Cell::new(0.0)),
            zero_counts,
            counts_per_gram: SIM_COUNTS_PER_GRAM,
        }
    }

    pub fn handle(&self) -> LoadCellHandle {
        LoadCellHandle {
            grams: Rc::clone(&self.grams),
        }
    }
}

impl Default for SimulatedLoadCell {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadCell for SimulatedLoadCell {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        let counts = (self.grams.get() * self.counts_per_gram).round() as i32;
        let raw = self.zero_counts.saturating_sub(counts);
        tracing::trace!(raw, "simulated load cell read");
        Ok(raw)
    }
}

/// Observable state of a [`SimulatedDriver`].
#[derive(Debug, Clone)]
pub struct DriverState {
    pub bridges: [(BridgeOutput, PwmChannel); 12],
    pub duty: u8,
    /// Every duty cycle written, in order.
    pub duty_log: Vec<u8>,
    /// Latched diagnosis bits; cleared by `clear_errors`.
    pub latched: u8,
    /// Bits that come back even after a clear (e.g. a disconnected motor).
    pub persistent: u8,
    pub clear_count: u32,
    pub diagnosis_reads: u32,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            bridges: [(BridgeOutput::Floating, PwmChannel::None); 12],
            duty: 0,
            duty_log: Vec::new(),
            latched: 0,
            persistent: 0,
            clear_count: 0,
            diagnosis_reads: 0,
        }
    }
}

/// In-memory half-bridge driver.
#[derive(Default)]
pub struct SimulatedDriver {
    state: Rc<RefCell<DriverState>>,
}

/// Shared view of a [`SimulatedDriver`] for assertions and fault injection.
#[derive(Clone)]
pub struct DriverProbe {
    state: Rc<RefCell<DriverState>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> DriverProbe {
        DriverProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl DriverProbe {
    pub fn snapshot(&self) -> DriverState {
        self.state.borrow().clone()
    }

    pub fn bridge(&self, hb: HalfBridge) -> (BridgeOutput, PwmChannel) {
        self.state.borrow().bridges[hb as usize]
    }

    pub fn duty_log(&self) -> Vec<u8> {
        self.state.borrow().duty_log.clone()
    }

    pub fn clear_duty_log(&self) {
        self.state.borrow_mut().duty_log.clear();
    }

    /// Latch fault bits until the next `clear_errors`.
    pub fn inject(&self, bits: u8) {
        self.state.borrow_mut().latched |= bits;
    }

    /// Fault bits that survive `clear_errors`.
    pub fn set_persistent(&self, bits: u8) {
        self.state.borrow_mut().persistent = bits;
    }

    pub fn clear_count(&self) -> u32 {
        self.state.borrow().clear_count
    }
}

impl MotorDriver for SimulatedDriver {
    fn configure(
        &mut self,
        bridge: HalfBridge,
        output: BridgeOutput,
        pwm: PwmChannel,
    ) -> Result<(), BoxError> {
        self.state.borrow_mut().bridges[bridge as usize] = (output, pwm);
        Ok(())
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), BoxError> {
        let mut st = self.state.borrow_mut();
        st.duty = duty;
        st.duty_log.push(duty);
        Ok(())
    }

    fn diagnosis(&mut self) -> Result<DiagRegister, BoxError> {
        let mut st = self.state.borrow_mut();
        st.diagnosis_reads = st.diagnosis_reads.saturating_add(1);
        Ok(DiagRegister(st.latched | st.persistent))
    }

    fn clear_errors(&mut self) -> Result<(), BoxError> {
        let mut st = self.state.borrow_mut();
        st.latched = 0;
        st.clear_count = st.clear_count.saturating_add(1);
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareLoadCell {
    hx711: hx711::Hx711,
}

#[cfg(feature = "hardware")]
impl HardwareLoadCell {
    /// Channel A, gain 128.
    pub fn new(dout_pin: u8, sck_pin: u8) -> error::Result<Self> {
        Ok(Self {
            hx711: hx711::Hx711::open(dout_pin, sck_pin, 25)?,
        })
    }
}

#[cfg(feature = "hardware")]
impl LoadCell for HardwareLoadCell {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        let max_attempts = 3;
        let mut attempts = 0;
        loop {
            match self.hx711.read_with_timeout(timeout) {
                Ok(raw) => return Ok(raw),
                Err(error::HwError::DataReadyTimeout) if attempts < max_attempts => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "load cell timeout, retrying");
                }
                Err(e) => {
                    tracing::error!(error = %e, "load cell read failed");
                    return Err(Box::new(e));
                }
            }
        }
    }
}
