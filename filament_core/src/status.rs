//! Tracker status machine and the per-poll sample.

/// Status of the weight tracker; selects the per-sample filter policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum TrackerState {
    /// Not initialised; readings are forced to zero.
    #[default]
    #[strum(serialize = "Started")]
    None,
    /// Settling after a reset; readings are not accounted.
    #[strum(serialize = "Ready")]
    Ready,
    /// Print job running; consumption is accounted.
    #[strum(serialize = "Running")]
    Run,
    /// Roll being loaded; backward noise jumps are rejected.
    #[strum(serialize = "Load")]
    Load,
}

/// Flags raised by the tracker for the command and display layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerFlags {
    /// The last RUN sample jumped by at least the tension threshold.
    pub extruder_tension: bool,
    /// The spool configuration changed and has not been acknowledged.
    pub material_changed: bool,
}

/// Result of one `poll()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    pub state: TrackerState,
    /// Filtered reading in grams (sign corrected, tare not subtracted).
    pub last_read: f32,
    /// Baseline reading in grams.
    pub prev_read: f32,
    pub extruder_tension: bool,
}
