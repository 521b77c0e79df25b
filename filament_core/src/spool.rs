//! Filament spool parameters.
//!
//! Densities behind the table: PLA 1.25 g/cm³, ABS 1.04 g/cm³. A 1 kg roll
//! holds roughly 330 m (PLA 1.75), 110 m (PLA 3.00), 400 m (ABS 1.75) or
//! 130 m (ABS 3.00) of filament.

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
pub enum Material {
    #[default]
    #[strum(serialize = "PLA")]
    Pla,
    #[strum(serialize = "ABS")]
    Abs,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
pub enum Diameter {
    #[default]
    #[strum(serialize = "1.75 mm")]
    D175,
    #[strum(serialize = "3.00 mm")]
    D300,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
pub enum RollSize {
    #[default]
    #[strum(serialize = "1 kg")]
    OneKg,
    #[strum(serialize = "2 kg")]
    TwoKg,
}

impl RollSize {
    /// Filament weight of a full roll in grams.
    pub fn nominal_grams(self) -> f32 {
        match self {
            RollSize::OneKg => 1000.0,
            RollSize::TwoKg => 2000.0,
        }
    }

    /// Weight of the empty plastic spool in grams.
    // TODO: the 2 kg value is an estimate; weigh an empty 2 kg spool.
    pub fn spool_tare_grams(self) -> f32 {
        match self {
            RollSize::OneKg => 225.0,
            RollSize::TwoKg => 250.0,
        }
    }
}

/// Grams of filament in one centimeter.
pub fn grams_per_cm(material: Material, diameter: Diameter) -> f32 {
    match (material, diameter) {
        (Material::Pla, Diameter::D175) => 0.03,
        (Material::Pla, Diameter::D300) => 0.09,
        (Material::Abs, Diameter::D175) => 0.025,
        (Material::Abs, Diameter::D300) => 0.076,
    }
}

/// Which spool is mounted; the inputs of [`FilamentSpool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpoolSelection {
    pub material: Material,
    pub diameter: Diameter,
    pub roll: RollSize,
}

/// Active spool configuration with its derived constants.
///
/// Fields are private: every change goes through a constructor so the derived
/// values can never disagree with the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilamentSpool {
    selection: SpoolSelection,
    grams_per_cm: f32,
    cm_per_gram: f32,
    nominal_weight_g: f32,
    tare_g: f32,
}

impl FilamentSpool {
    /// `motor_group_g` is the weight of the motor group resting on the cell
    /// (0 when the motor is mounted elsewhere).
    pub fn new(selection: SpoolSelection, motor_group_g: f32) -> Self {
        let gpc = grams_per_cm(selection.material, selection.diameter);
        Self {
            selection,
            grams_per_cm: gpc,
            cm_per_gram: 1.0 / gpc,
            nominal_weight_g: selection.roll.nominal_grams(),
            tare_g: selection.roll.spool_tare_grams() + motor_group_g,
        }
    }

    pub fn with_material(&self, material: Material) -> Self {
        self.rebuild(SpoolSelection {
            material,
            ..self.selection
        })
    }

    pub fn with_diameter(&self, diameter: Diameter) -> Self {
        self.rebuild(SpoolSelection {
            diameter,
            ..self.selection
        })
    }

    pub fn with_roll(&self, roll: RollSize) -> Self {
        self.rebuild(SpoolSelection {
            roll,
            ..self.selection
        })
    }

    fn rebuild(&self, selection: SpoolSelection) -> Self {
        Self::new(selection, self.motor_group_g())
    }

    pub fn selection(&self) -> SpoolSelection {
        self.selection
    }
    pub fn material(&self) -> Material {
        self.selection.material
    }
    pub fn diameter(&self) -> Diameter {
        self.selection.diameter
    }
    pub fn roll(&self) -> RollSize {
        self.selection.roll
    }
    pub fn grams_per_cm(&self) -> f32 {
        self.grams_per_cm
    }
    pub fn cm_per_gram(&self) -> f32 {
        self.cm_per_gram
    }
    pub fn nominal_weight_g(&self) -> f32 {
        self.nominal_weight_g
    }
    /// Spool tare plus the motor group, when it sits on the cell.
    pub fn tare_g(&self) -> f32 {
        self.tare_g
    }
    pub fn motor_group_g(&self) -> f32 {
        self.tare_g - self.selection.roll.spool_tare_grams()
    }

    /// Length in centimeters of `grams` of this filament.
    pub fn grams_to_cm(&self, grams: f32) -> f32 {
        grams / self.grams_per_cm
    }

    /// Remaining filament as a percentage of a full roll.
    pub fn remaining_percent(&self, net_weight_g: f32) -> f32 {
        net_weight_g * 100.0 / self.nominal_weight_g
    }
}

impl Default for FilamentSpool {
    fn default() -> Self {
        Self::new(SpoolSelection::default(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn reciprocal_for_every_material_and_diameter() {
        for m in Material::iter() {
            for d in Diameter::iter() {
                let s = FilamentSpool::new(
                    SpoolSelection {
                        material: m,
                        diameter: d,
                        roll: RollSize::OneKg,
                    },
                    0.0,
                );
                let product = s.grams_per_cm() * s.cm_per_gram();
                assert!((product - 1.0).abs() < 1e-5, "{m} {d}: {product}");
            }
        }
    }

    #[test]
    fn abs_300_uses_its_own_row() {
        let s = FilamentSpool::default()
            .with_material(Material::Abs)
            .with_diameter(Diameter::D300);
        assert_eq!(s.grams_per_cm(), 0.076);
    }

    #[test]
    fn changing_roll_recomputes_tare_and_keeps_motor_group() {
        let s = FilamentSpool::new(SpoolSelection::default(), 158.5);
        assert_eq!(s.tare_g(), 383.5);
        let big = s.with_roll(RollSize::TwoKg);
        assert_eq!(big.tare_g(), 408.5);
        assert_eq!(big.nominal_weight_g(), 2000.0);
        assert_eq!(big.material(), Material::Pla);
    }

    #[test]
    fn descriptors() {
        let s = FilamentSpool::default();
        assert_eq!(s.material().to_string(), "PLA");
        assert_eq!(s.diameter().to_string(), "1.75 mm");
        assert_eq!(s.roll().to_string(), "1 kg");
    }

    #[test]
    fn remaining_percent_of_roll() {
        let s = FilamentSpool::default();
        assert_eq!(s.remaining_percent(250.0), 25.0);
    }
}
