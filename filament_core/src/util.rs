//! Numeric helpers shared by the tracker and the display layer.

/// Number of centimeters in one meter.
pub const CENTIMETERS_PER_METER: f32 = 100.0;

/// Reduce a value to one decimal place by truncation toward zero.
#[inline]
pub fn val_optimizer(value: f32) -> f32 {
    let t = (value * 10.0).trunc() / 10.0;
    // -0.0 prints as "-0"
    if t == 0.0 { 0.0 } else { t }
}

/// Unit used to report consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr)]
pub enum Units {
    #[default]
    #[strum(serialize = "gr")]
    Grams,
    #[strum(serialize = "cm")]
    Length,
}

/// A length chosen for display: centimeters up to one meter, meters above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthDisplay {
    Centimeters(f32),
    Meters(f32),
}

impl LengthDisplay {
    pub fn from_cm(cm: f32) -> Self {
        if cm > CENTIMETERS_PER_METER {
            LengthDisplay::Meters(cm / CENTIMETERS_PER_METER)
        } else {
            LengthDisplay::Centimeters(val_optimizer(cm))
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            LengthDisplay::Centimeters(_) => "cm",
            LengthDisplay::Meters(_) => "m",
        }
    }
}
