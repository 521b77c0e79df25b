//! Hardware seams shared by the tracker, the motor ramp and the backends.
//!
//! The core never touches pins or buses directly: the load cell and the
//! half-bridge driver are owned handles behind these traits, so tests and the
//! console can run against simulated hardware.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type crossing the trait boundary; mapped to typed errors in the core.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw load-cell amplifier (HX711 or a simulation).
pub trait LoadCell {
    /// Block until one conversion is ready and return the signed 24-bit count.
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

/// One of the twelve half-bridge outputs of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HalfBridge {
    Hb1,
    Hb2,
    Hb3,
    Hb4,
    Hb5,
    Hb6,
    Hb7,
    Hb8,
    Hb9,
    Hb10,
    Hb11,
    Hb12,
}

impl HalfBridge {
    pub const ALL: [HalfBridge; 12] = [
        HalfBridge::Hb1,
        HalfBridge::Hb2,
        HalfBridge::Hb3,
        HalfBridge::Hb4,
        HalfBridge::Hb5,
        HalfBridge::Hb6,
        HalfBridge::Hb7,
        HalfBridge::Hb8,
        HalfBridge::Hb9,
        HalfBridge::Hb10,
        HalfBridge::Hb11,
        HalfBridge::Hb12,
    ];
}

/// Static level of a half-bridge output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutput {
    Floating,
    Low,
    High,
}

/// PWM routing for a half-bridge. Only one PWM generator is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    None,
    Pwm1,
}

/// Raw system diagnosis register of the driver.
///
/// Bit layout (a set bit means the condition is present):
///
/// | bit | meaning           |
/// |-----|-------------------|
/// | 7   | SPI error         |
/// | 6   | open load         |
/// | 5   | under-voltage     |
/// | 4   | over-voltage      |
/// | 3   | power-on reset    |
/// | 2   | thermal shutdown  |
/// | 1   | thermal warning   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagRegister(pub u8);

impl DiagRegister {
    pub const SPI_ERROR: u8 = 1 << 7;
    pub const OPEN_LOAD: u8 = 1 << 6;
    pub const UNDER_VOLTAGE: u8 = 1 << 5;
    pub const OVER_VOLTAGE: u8 = 1 << 4;
    pub const POWER_ON_RESET: u8 = 1 << 3;
    pub const THERMAL_SHUTDOWN: u8 = 1 << 2;
    pub const THERMAL_WARNING: u8 = 1 << 1;

    #[inline]
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Multi half-bridge DC motor driver (TLE94112 style).
pub trait MotorDriver {
    fn configure(
        &mut self,
        bridge: HalfBridge,
        output: BridgeOutput,
        pwm: PwmChannel,
    ) -> Result<(), BoxError>;
    /// Set the PWM1 duty cycle (0..=255, 200 Hz).
    fn set_duty(&mut self, duty: u8) -> Result<(), BoxError>;
    fn diagnosis(&mut self) -> Result<DiagRegister, BoxError>;
    fn clear_errors(&mut self) -> Result<(), BoxError>;
}

impl<T: LoadCell + ?Sized> LoadCell for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        (**self).read(timeout)
    }
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn configure(
        &mut self,
        bridge: HalfBridge,
        output: BridgeOutput,
        pwm: PwmChannel,
    ) -> Result<(), BoxError> {
        (**self).configure(bridge, output, pwm)
    }
    fn set_duty(&mut self, duty: u8) -> Result<(), BoxError> {
        (**self).set_duty(duty)
    }
    fn diagnosis(&mut self) -> Result<DiagRegister, BoxError> {
        (**self).diagnosis()
    }
    fn clear_errors(&mut self) -> Result<(), BoxError> {
        (**self).clear_errors()
    }
}
