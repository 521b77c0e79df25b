use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{sign_extend_24, wait_for_data_ready};

/// Bit-banged HX711 on two GPIO lines.
pub struct Hx711 {
    dout: rppal::gpio::InputPin,
    sck: rppal::gpio::OutputPin,
    // 25 = channel A gain 128, 26 = channel B gain 32, 27 = channel A gain 64
    gain_pulses: u8,
}

impl Hx711 {
    pub fn open(dout_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dout = gpio
            .get(dout_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 dout {dout_pin}: {e}")))?
            .into_input();
        let mut sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 sck {sck_pin}: {e}")))?
            .into_output();
        sck.set_low();
        Ok(Self {
            dout,
            sck,
            gain_pulses,
        })
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        let dout = &self.dout;
        wait_for_data_ready(|| dout.is_high(), timeout, Duration::from_micros(200))?;

        let mut word: u32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay();
            word = (word << 1) | u32::from(self.dout.is_high());
            self.sck.set_low();
            spin_delay();
        }

        // Extra pulses select channel/gain for the next conversion
        for _ in 24..self.gain_pulses {
            self.sck.set_high();
            spin_delay();
            self.sck.set_low();
            spin_delay();
        }

        let raw = sign_extend_24(word);
        trace!(raw, "hx711 raw read");
        Ok(raw)
    }
}

#[inline(always)]
fn spin_delay() {
    std::hint::spin_loop();
}
