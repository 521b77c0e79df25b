use filament_config::{DiameterName, MaterialName, RollName, Wiring, load_file, load_toml};
use rstest::rstest;
use std::io::Write;

const FULL: &str = r#"
[pins]
hx711_dout = 5
hx711_sck = 6

[scale]
calibration_factor = 420.0
samples = 8
calibration_steps = 12
invert = false

[tracker]
tension_threshold_g = 80.0
max_delta_in_range_g = 12.5
scale_resolution_g = 1.0
motor_group_on_scale = false

[spool]
material = "abs"
diameter = "3.00"
roll = "2kg"

[motor]
wiring = "high_current"
ignore_open_load = false

[motor.extruder]
min_dc = 30
max_dc = 90
step_delay_ms = 4

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn parses_every_section() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.pins.hx711_dout, 5);
    assert_eq!(cfg.scale.samples, 8);
    assert!(!cfg.scale.invert);
    assert!(!cfg.tracker.motor_group_on_scale);
    assert_eq!(cfg.spool.material, MaterialName::Abs);
    assert_eq!(cfg.spool.diameter, DiameterName::D300);
    assert_eq!(cfg.spool.roll, RollName::TwoKg);
    assert_eq!(cfg.motor.wiring, Wiring::HighCurrent);
    assert_eq!(cfg.motor.extruder.max_dc, 90);
    // untouched profiles keep their defaults
    assert_eq!(cfg.motor.feed.max_dc, 255);
}

#[test]
fn uppercase_material_alias_is_accepted() {
    let cfg = load_toml("[spool]\nmaterial = \"PLA\"\n").expect("parse");
    assert_eq!(cfg.spool.material, MaterialName::Pla);
}

#[rstest]
#[case("[scale]\ncalibration_factor = 0.0\n", "calibration_factor")]
#[case("[scale]\nsamples = 0\n", "samples must be >= 1")]
#[case("[tracker]\ntension_threshold_g = 0.0\n", "tension_threshold_g")]
#[case("[tracker]\nmax_delta_in_range_g = -1.0\n", "max_delta_in_range_g")]
#[case("[tracker]\ntension_threshold_g = nan\n", "tension_threshold_g")]
#[case("[tracker]\ntension_threshold_g = inf\n", "tension_threshold_g")]
#[case("[tracker]\nmax_delta_in_range_g = nan\n", "max_delta_in_range_g")]
#[case("[tracker]\nscale_resolution_g = inf\n", "scale_resolution_g")]
#[case("[tracker]\nmotor_group_weight_g = nan\n", "motor_group_weight_g")]
#[case(
    "[motor.load]\nmin_dc = 200\nmax_dc = 100\nstep_delay_ms = 5\n",
    "motor.load.min_dc must be <= max_dc"
)]
#[case("[hardware]\npoll_interval_ms = 0\n", "poll_interval_ms")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error `{err}` should mention `{needle}`"
    );
}

#[test]
fn unknown_material_fails_to_parse() {
    assert!(load_toml("[spool]\nmaterial = \"petg\"\n").is_err());
}

#[test]
fn load_file_reads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(FULL.as_bytes()).expect("write");
    let cfg = load_file(file.path()).expect("load");
    assert_eq!(cfg.scale.calibration_factor, 420.0);

    let mut bad = tempfile::NamedTempFile::new().expect("temp file");
    bad.write_all(b"[scale]\nsamples = 0\n").expect("write");
    assert!(load_file(bad.path()).is_err());
}
