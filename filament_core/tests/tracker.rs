use filament_core::{
    LengthDisplay, Material, RollSize, SpoolSelection, TrackerCfg, TrackerState, Units,
    WeightTracker,
};
use filament_hardware::{LoadCellHandle, SimulatedLoadCell};
use rstest::rstest;

fn tracker(cfg: TrackerCfg) -> (WeightTracker<SimulatedLoadCell>, LoadCellHandle) {
    let cell = SimulatedLoadCell::new();
    let handle = cell.handle();
    let mut t = WeightTracker::new(cell, cfg).expect("valid tracker config");
    t.begin().expect("begin");
    (t, handle)
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

/// Put `grams` on the scale and poll once.
fn weigh(t: &mut WeightTracker<SimulatedLoadCell>, h: &LoadCellHandle, grams: f32) {
    h.set_grams(grams);
    t.poll().expect("poll");
}

#[test]
fn begin_enters_ready_with_default_spool() {
    let (t, _) = tracker(TrackerCfg::default());
    assert_eq!(t.state(), TrackerState::Ready);
    assert_eq!(t.spool().selection(), SpoolSelection::default());
    assert_eq!(t.calibration_factor(), 434.5);
    assert_eq!(t.last_read(), 0.0);
    assert_eq!(t.units(), Units::Grams);
    assert!(!t.material_changed());
}

#[test]
fn ready_readings_are_not_accounted() {
    let (mut t, h) = tracker(TrackerCfg::default());
    weigh(&mut t, &h, 800.0);
    assert_eq!(t.last_read(), 800.0);
    assert_eq!(t.prev_read(), 800.0);
    assert_eq!(t.consumed_grams(), 0.0);
}

#[test]
fn run_tension_keeps_baseline_and_small_delta_advances_it() {
    let (mut t, h) = tracker(TrackerCfg::default());
    weigh(&mut t, &h, 500.0);
    t.set_state(TrackerState::Run);
    assert_eq!(t.prev_read(), 500.0);

    weigh(&mut t, &h, 620.0);
    assert!(t.extruder_tension_detected());
    assert_eq!(t.prev_read(), 500.0);
    assert_eq!(t.last_read(), 620.0);
    // tension samples are not accounted
    assert_eq!(t.consumed_grams(), 0.0);

    weigh(&mut t, &h, 450.0);
    assert!(!t.extruder_tension_detected());
    assert_eq!(t.prev_read(), 450.0);
    assert_eq!(t.last_read(), 450.0);
}

#[test]
fn run_accounts_consumption_from_net_weight() {
    let (mut t, h) = tracker(TrackerCfg::default());
    weigh(&mut t, &h, 500.0);
    t.set_state(TrackerState::Run);
    // tare = 225 g spool + 158.5 g motor group
    assert!(approx(t.initial_weight(), 116.5));

    weigh(&mut t, &h, 450.0);
    assert!(approx(t.consumed_grams(), 50.0));
    assert!(approx(t.consumed_centimeters(), 50.0 / 0.03));
    match t.consumed_length() {
        LengthDisplay::Meters(m) => assert!(approx(m, 16.666_67)),
        other => panic!("expected meters, got {other:?}"),
    }
}

#[rstest]
#[case::heavier(520.0)]
#[case::below_resolution(499.0)]
fn noise_consumption_keeps_last_good_value(#[case] grams: f32) {
    let (mut t, h) = tracker(TrackerCfg::default());
    weigh(&mut t, &h, 500.0);
    t.set_state(TrackerState::Run);
    weigh(&mut t, &h, 480.0);
    assert!(approx(t.consumed_grams(), 20.0));

    weigh(&mut t, &h, grams);
    assert!(approx(t.consumed_grams(), 20.0), "{}", t.consumed_grams());
}

#[test]
fn consumption_from_zero_is_suppressed_below_resolution() {
    let (mut t, h) = tracker(TrackerCfg::default());
    weigh(&mut t, &h, 500.0);
    t.set_state(TrackerState::Run);
    weigh(&mut t, &h, 499.0);
    assert_eq!(t.consumed_grams(), 0.0);
}

#[test]
fn load_rejects_large_backward_jumps() {
    let (mut t, h) = tracker(TrackerCfg::default());
    t.set_state(TrackerState::Load);
    weigh(&mut t, &h, 500.0);
    assert_eq!(t.last_read(), 500.0);

    weigh(&mut t, &h, 480.0);
    assert_eq!(t.last_read(), 500.0);
    assert_eq!(t.prev_read(), 500.0);

    weigh(&mut t, &h, 496.0);
    assert_eq!(t.last_read(), 496.0);
    assert_eq!(t.prev_read(), 496.0);
}

#[test]
fn reset_restores_default_spool_and_reset_with_keeps_selection() {
    let (mut t, h) = tracker(TrackerCfg::default());
    t.set_material(Material::Abs);
    t.set_roll(RollSize::TwoKg);
    t.set_units(Units::Length);
    weigh(&mut t, &h, 300.0);

    let mounted = t.spool().selection();
    h.set_grams(0.0);
    t.reset_with(mounted).expect("reset");
    assert_eq!(t.spool().material(), Material::Abs);
    assert_eq!(t.spool().roll(), RollSize::TwoKg);
    assert_eq!(t.units(), Units::Grams);
    assert_eq!(t.last_read(), 0.0);
    assert_eq!(t.state(), TrackerState::Ready);

    t.acknowledge_material_change();
    t.reset().expect("reset");
    assert_eq!(t.spool().selection(), SpoolSelection::default());
    assert!(t.material_changed());
}

#[test]
fn remaining_uses_net_weight_and_roll_size() {
    let cfg = TrackerCfg {
        motor_group_g: 0.0,
        ..TrackerCfg::default()
    };
    let (mut t, h) = tracker(cfg);
    weigh(&mut t, &h, 476.0);
    let r = t.remaining();
    assert!(approx(r.net_g, 251.0));
    assert!(approx(r.percent, 25.1));
    assert!(matches!(r.length, LengthDisplay::Meters(m) if approx(m, 251.0 / 0.03 / 100.0)));
    assert!(approx(t.remaining_percent(500.0), 50.0));
}

#[test]
fn read_weight_leaves_state_alone() {
    let (mut t, h) = tracker(TrackerCfg::default());
    h.set_grams(42.0);
    let w = t.read_weight().expect("read");
    assert_eq!(w, 42.0);
    assert_eq!(t.last_read(), 0.0);
    assert_eq!(t.state(), TrackerState::Ready);
}

#[test]
fn snapshot_reports_descriptors() {
    let (mut t, _) = tracker(TrackerCfg::default());
    t.set_material(Material::Abs);
    let s = t.snapshot();
    assert_eq!(s.material, "ABS");
    assert_eq!(s.diameter, "1.75 mm");
    assert_eq!(s.roll, "1 kg");
    assert_eq!(s.state, TrackerState::Ready);
    assert!(s.flags.material_changed);
    assert_eq!(s.calibration_phase, None);
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = TrackerCfg {
        samples: 0,
        ..TrackerCfg::default()
    };
    assert!(WeightTracker::new(SimulatedLoadCell::new(), cfg).is_err());
}

#[rstest]
#[case(f32::NAN, 1.0, 0.0)]
#[case(1.0, f32::NAN, 0.0)]
#[case(1.0, 1.0, f32::INFINITY)]
fn non_finite_thresholds_are_rejected(
    #[case] max_delta: f32,
    #[case] resolution: f32,
    #[case] motor_group: f32,
) {
    let mut cfg = TrackerCfg {
        scale_resolution_g: resolution,
        motor_group_g: motor_group,
        ..TrackerCfg::default()
    };
    cfg.thresholds.max_delta_in_range_g = max_delta;
    assert!(WeightTracker::new(SimulatedLoadCell::new(), cfg).is_err());
}

#[test]
fn nan_tension_threshold_is_rejected() {
    let mut cfg = TrackerCfg::default();
    cfg.thresholds.tension_g = f32::NAN;
    assert!(WeightTracker::new(SimulatedLoadCell::new(), cfg).is_err());
}
