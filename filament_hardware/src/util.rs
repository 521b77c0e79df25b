use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `is_high` until the HX711 DOUT line drops (conversion ready) or the
/// timeout expires. Returns the number of polls that saw the line high.
pub fn wait_for_data_ready(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<u32> {
    let deadline = Instant::now() + timeout;
    let mut polls = 0u32;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        polls = polls.saturating_add(1);
        std::thread::sleep(poll_interval);
    }
    Ok(polls)
}

/// Sign-extend a 24-bit two's complement HX711 word.
#[inline]
pub fn sign_extend_24(value: u32) -> i32 {
    let v = (value & 0x00FF_FFFF) as i32;
    if v & 0x0080_0000 != 0 { v | !0x00FF_FFFF } else { v }
}
