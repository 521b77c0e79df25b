//! Decoded driver diagnosis.

use filament_traits::DiagRegister;
use std::fmt;

/// Variants follow the register bits from high to low.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
pub enum Fault {
    #[strum(serialize = "SPI error")]
    Spi,
    #[strum(serialize = "open load")]
    OpenLoad,
    #[strum(serialize = "under-voltage")]
    UnderVoltage,
    #[strum(serialize = "over-voltage")]
    OverVoltage,
    #[strum(serialize = "power-on reset")]
    PowerOnReset,
    #[strum(serialize = "thermal shutdown")]
    ThermalShutdown,
    #[strum(serialize = "thermal warning")]
    ThermalWarning,
}

impl Fault {
    pub const fn bit(self) -> u8 {
        match self {
            Fault::Spi => DiagRegister::SPI_ERROR,
            Fault::OpenLoad => DiagRegister::OPEN_LOAD,
            Fault::UnderVoltage => DiagRegister::UNDER_VOLTAGE,
            Fault::OverVoltage => DiagRegister::OVER_VOLTAGE,
            Fault::PowerOnReset => DiagRegister::POWER_ON_RESET,
            Fault::ThermalShutdown => DiagRegister::THERMAL_SHUTDOWN,
            Fault::ThermalWarning => DiagRegister::THERMAL_WARNING,
        }
    }
}

const KNOWN_BITS: u8 = DiagRegister::SPI_ERROR
    | DiagRegister::OPEN_LOAD
    | DiagRegister::UNDER_VOLTAGE
    | DiagRegister::OVER_VOLTAGE
    | DiagRegister::POWER_ON_RESET
    | DiagRegister::THERMAL_SHUTDOWN
    | DiagRegister::THERMAL_WARNING;

/// Set of driver faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultReport {
    bits: u8,
}

impl FaultReport {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Decode a raw register; bit 0 is not a fault and is dropped.
    pub const fn from_register(reg: DiagRegister) -> Self {
        Self {
            bits: reg.0 & KNOWN_BITS,
        }
    }

    pub fn from_faults(faults: &[Fault]) -> Self {
        Self {
            bits: faults.iter().fold(0, |acc, f| acc | f.bit()),
        }
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub const fn contains(self, fault: Fault) -> bool {
        self.bits & fault.bit() != 0
    }

    pub const fn raw(self) -> u8 {
        self.bits
    }

    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub const fn is_open_load_only(self) -> bool {
        self.bits == DiagRegister::OPEN_LOAD
    }

    /// Faults to report under the open-load policy. Open load alone is
    /// hidden when ignored; together with any other fault the full set is
    /// reported.
    pub const fn surfaced(self, ignore_open_load: bool) -> Self {
        if ignore_open_load && self.is_open_load_only() {
            Self::empty()
        } else {
            self
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Fault> {
        use strum::IntoEnumIterator;
        Fault::iter().filter(move |f| self.contains(*f))
    }
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, fault) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{fault}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DiagRegister::OPEN_LOAD, true, 0)]
    #[case(DiagRegister::OPEN_LOAD, false, DiagRegister::OPEN_LOAD)]
    #[case(
        DiagRegister::OPEN_LOAD | DiagRegister::THERMAL_WARNING,
        true,
        DiagRegister::OPEN_LOAD | DiagRegister::THERMAL_WARNING
    )]
    #[case(DiagRegister::UNDER_VOLTAGE, true, DiagRegister::UNDER_VOLTAGE)]
    #[case(0, true, 0)]
    fn open_load_policy(#[case] reg: u8, #[case] ignore: bool, #[case] want: u8) {
        let r = FaultReport::from_register(DiagRegister(reg));
        assert_eq!(r.surfaced(ignore).raw(), want);
    }

    #[test]
    fn bit_zero_is_not_a_fault() {
        assert!(FaultReport::from_register(DiagRegister(1)).is_empty());
    }

    #[test]
    fn display_lists_faults_in_register_order() {
        let r = FaultReport::from_faults(&[Fault::OpenLoad, Fault::Spi]);
        assert_eq!(r.to_string(), "SPI error, open load");
        let r = FaultReport::from_faults(&[
            Fault::ThermalWarning,
            Fault::UnderVoltage,
            Fault::OpenLoad,
        ]);
        assert_eq!(r.to_string(), "open load, under-voltage, thermal warning");
        assert_eq!(FaultReport::empty().to_string(), "none");
    }
}
