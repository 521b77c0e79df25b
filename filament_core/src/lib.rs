#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core logic of the filament dispenser (hardware-agnostic).
//!
//! All hardware goes through `filament_traits::LoadCell` and
//! `filament_traits::MotorDriver`, owned by the component that uses them.
//!
//! ## Architecture
//!
//! - **Weight tracking**: status machine, per-state filter and consumption
//!   accounting (`tracker`, `filter`, `status`)
//! - **Scale**: averaging, tare and factor over the raw cell (`scale`)
//! - **Calibration**: three-phase factor measurement (`calibration`)
//! - **Spool**: material/diameter/roll table (`spool`)
//! - **Motor**: duty-cycle ramps, brake and diagnosis (`motor`, `fault`)
//! - **Configuration**: runtime config structs and `From` mappings from the
//!   TOML schema (`config`, `conversions`)
//!
//! The tracker and the motor never call each other; the command layer
//! connects them.

pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod fault;
pub mod filter;
pub mod hw_error;
pub mod mocks;
pub mod motor;
pub mod scale;
pub mod spool;
pub mod status;
pub mod tracker;
pub mod util;

pub use calibration::{CalibrationPhase, CalibrationStep};
pub use config::{MotorCfg, RampProfile, TrackerCfg, Wiring};
pub use error::{BuildError, DispenserError, Report, Result};
pub use fault::{Fault, FaultReport};
pub use filter::{FilterOutcome, FilterThresholds};
pub use motor::{Direction, MotorRamp, RampPhase, RunSummary};
pub use spool::{Diameter, FilamentSpool, Material, RollSize, SpoolSelection};
pub use status::{TrackerFlags, TrackerState, WeightSample};
pub use tracker::{Remaining, TrackerSnapshot, WeightTracker};
pub use util::{LengthDisplay, Units, val_optimizer};
