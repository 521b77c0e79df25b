use std::time::Duration;

use filament_core::{Direction, MotorCfg, MotorRamp, RampPhase, RampProfile, Wiring};
use filament_hardware::{DriverProbe, SimulatedDriver};
use filament_traits::clock::test_clock::TestClock;
use filament_traits::{BoxError, BridgeOutput, DiagRegister, HalfBridge, MotorDriver, PwmChannel};
use rstest::rstest;

const PROFILE: RampProfile = RampProfile::new(10, 20, Duration::from_millis(5));

fn ramp(wiring: Wiring) -> (MotorRamp<SimulatedDriver>, DriverProbe, TestClock) {
    let driver = SimulatedDriver::new();
    let probe = driver.probe();
    let clock = TestClock::new();
    let cfg = MotorCfg {
        wiring,
        ..MotorCfg::default()
    };
    let mut m = MotorRamp::new(driver, cfg)
        .expect("valid motor config")
        .with_clock(Box::new(clock.clone()));
    m.begin().expect("begin");
    probe.clear_duty_log();
    (m, probe, clock)
}

fn used_bridges(wiring: Wiring) -> &'static [HalfBridge] {
    match wiring {
        Wiring::Standard => &[HalfBridge::Hb1, HalfBridge::Hb2],
        Wiring::HighCurrent => &[
            HalfBridge::Hb1,
            HalfBridge::Hb2,
            HalfBridge::Hb3,
            HalfBridge::Hb4,
        ],
    }
}

fn assert_braked(probe: &DriverProbe, wiring: Wiring) {
    for hb in used_bridges(wiring) {
        assert_eq!(
            probe.bridge(*hb),
            (BridgeOutput::High, PwmChannel::None),
            "{hb:?} not braked"
        );
    }
}

/// Steps of one unit, rising then falling.
fn assert_ramp_shape(log: &[u8]) {
    let peak = log
        .iter()
        .position(|d| Some(d) == log.iter().max())
        .expect("non-empty log");
    for w in log.windows(2) {
        assert!(w[0].abs_diff(w[1]) <= 1, "jump in {log:?}");
    }
    assert!(log[..=peak].windows(2).all(|w| w[0] <= w[1]), "{log:?}");
    assert!(log[peak..].windows(2).all(|w| w[0] >= w[1]), "{log:?}");
}

#[rstest]
fn timed_run_ends_braked(
    #[values(Direction::Feed, Direction::Load)] direction: Direction,
    #[values(Wiring::Standard, Wiring::HighCurrent)] wiring: Wiring,
) {
    let (mut m, probe, _) = ramp(wiring);
    let summary = m
        .run_timed(PROFILE, Duration::from_millis(100), direction)
        .expect("run");
    assert_braked(&probe, wiring);
    assert_eq!(m.phase(), RampPhase::Braking);
    assert_eq!(m.duty(), 0);
    assert_eq!(m.direction(), direction);
    assert!(!m.is_running());
    assert!(summary.faults.is_empty());
}

#[test]
fn timed_run_ramps_up_holds_and_down() {
    let (mut m, probe, clock) = ramp(Wiring::Standard);
    let hold = Duration::from_millis(100);
    let summary = m.run_timed(PROFILE, hold, Direction::Feed).unwrap();

    let log = probe.duty_log();
    assert_eq!(log.first(), Some(&10));
    assert_eq!(log.iter().max(), Some(&20));
    assert_eq!(log.last(), Some(&10));
    assert_ramp_shape(&log);
    assert_eq!(summary.steps, 21);
    assert_eq!(log.len(), 21);

    let sleeps = clock.sleeps();
    assert_eq!(sleeps.iter().filter(|d| **d == hold).count(), 1);
    assert_eq!(clock.elapsed(), PROFILE.step_delay * 21 + hold);
}

#[rstest]
#[case(Direction::Feed, HalfBridge::Hb1, HalfBridge::Hb2)]
#[case(Direction::Load, HalfBridge::Hb2, HalfBridge::Hb1)]
fn continuous_run_drives_one_pole(
    #[case] direction: Direction,
    #[case] driven: HalfBridge,
    #[case] grounded: HalfBridge,
) {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.start_continuous(PROFILE, direction).unwrap();
    assert_eq!(probe.bridge(driven), (BridgeOutput::High, PwmChannel::Pwm1));
    assert_eq!(probe.bridge(grounded), (BridgeOutput::Low, PwmChannel::None));
    assert_eq!(m.phase(), RampPhase::Steady);
    assert_eq!(m.duty(), 20);
    assert!(m.is_running());
}

#[test]
fn brake_ramps_continuous_run_down_through_start_bounds() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.start_continuous(PROFILE, Direction::Feed).unwrap();
    probe.clear_duty_log();

    let summary = m.brake().unwrap();
    let log = probe.duty_log();
    assert_eq!(log, (10..20).rev().collect::<Vec<u8>>());
    assert!(!log.contains(&0));
    assert_eq!(summary.steps, 10);
    assert_braked(&probe, Wiring::Standard);
}

#[test]
fn direction_change_brakes_first() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.feed_continuous().unwrap();
    m.load_continuous().unwrap();

    let feed = MotorCfg::default().feed;
    let log = probe.duty_log();
    assert_ramp_shape(&log[..(2 * feed.steps() - 1) as usize]);
    // down to min before the second ramp up
    let first_up = feed.steps() as usize;
    assert_eq!(log[first_up + feed.steps() as usize - 2], feed.min_dc);
    assert_eq!(m.direction(), Direction::Load);
    assert_eq!(
        probe.bridge(HalfBridge::Hb2),
        (BridgeOutput::High, PwmChannel::Pwm1)
    );
}

#[test]
fn brake_when_idle_asserts_outputs_only() {
    let (mut m, probe, clock) = ramp(Wiring::HighCurrent);
    let summary = m.brake().unwrap();
    assert_eq!(summary.steps, 0);
    assert!(probe.duty_log().is_empty());
    assert_eq!(clock.elapsed(), Duration::ZERO);
    assert_braked(&probe, Wiring::HighCurrent);
}

#[test]
fn timed_run_while_continuous_brakes_the_continuous_run() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.start_continuous(PROFILE, Direction::Load).unwrap();
    m.run_timed(PROFILE, Duration::from_millis(1), Direction::Feed)
        .unwrap();
    let log = probe.duty_log();
    // up, down (brake), up, down (timed)
    assert_eq!(log.len(), 11 + 10 + 11 + 10);
    for w in log.windows(2) {
        assert!(w[0].abs_diff(w[1]) <= 1, "jump in {log:?}");
    }
}

#[test]
fn faults_while_braking_for_direction_change_are_reported() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.start_continuous(PROFILE, Direction::Feed).unwrap();
    let clears = probe.clear_count();
    probe.inject(DiagRegister::UNDER_VOLTAGE);
    let summary = m.start_continuous(PROFILE, Direction::Load).unwrap();
    assert!(summary.faults.contains(filament_core::Fault::UnderVoltage));
    assert_eq!(probe.clear_count(), clears + 1);
    assert_eq!(m.direction(), Direction::Load);
}

#[test]
fn faults_while_braking_before_timed_run_are_reported() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.start_continuous(PROFILE, Direction::Load).unwrap();
    probe.inject(DiagRegister::THERMAL_WARNING);
    let summary = m
        .run_timed(PROFILE, Duration::from_millis(1), Direction::Feed)
        .unwrap();
    assert!(summary.faults.contains(filament_core::Fault::ThermalWarning));
    // brake ramp-down, then the timed ramp up and down
    assert_eq!(summary.steps, 10 + 11 + 10);
}

#[test]
fn begin_floats_unused_bridges() {
    let mut driver = SimulatedDriver::new();
    let probe = driver.probe();
    driver
        .configure(HalfBridge::Hb12, BridgeOutput::High, PwmChannel::Pwm1)
        .unwrap();
    let mut m = MotorRamp::new(driver, MotorCfg::default())
        .unwrap()
        .with_clock(Box::new(TestClock::new()));
    m.begin().unwrap();
    for hb in HalfBridge::ALL {
        assert_eq!(probe.bridge(hb), (BridgeOutput::Floating, PwmChannel::None));
    }
    assert_eq!(m.phase(), RampPhase::Idle);
}

#[test]
fn coast_zeroes_pwm_and_floats_legs() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    m.feed_continuous().unwrap();
    m.coast().unwrap();
    assert_eq!(probe.duty_log().last(), Some(&0));
    assert_eq!(
        probe.bridge(HalfBridge::Hb1),
        (BridgeOutput::Floating, PwmChannel::None)
    );
    assert!(!m.is_running());
}

#[test]
fn presets_use_configured_profiles() {
    let (mut m, probe, clock) = ramp(Wiring::Standard);
    let cfg = MotorCfg::default();
    m.feed_extruder(cfg.pulse_short).unwrap();
    let log = probe.duty_log();
    assert_eq!(log.first(), Some(&cfg.extruder.min_dc));
    assert_eq!(log.iter().max(), Some(&cfg.extruder.max_dc));
    assert!(clock.sleeps().contains(&cfg.pulse_short));

    probe.clear_duty_log();
    m.filament_load(cfg.pulse_long).unwrap();
    assert_eq!(probe.duty_log().iter().max(), Some(&cfg.load.max_dc));
    assert_eq!(m.direction(), Direction::Load);
}

#[test]
fn inverted_profile_is_rejected() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    let bad = RampProfile::new(30, 20, Duration::ZERO);
    assert!(m.run_timed(bad, Duration::ZERO, Direction::Feed).is_err());
    assert!(probe.duty_log().is_empty());

    let cfg = MotorCfg {
        feed: bad,
        ..MotorCfg::default()
    };
    assert!(MotorRamp::new(SimulatedDriver::new(), cfg).is_err());
}

#[test]
fn faults_during_run_are_reported_and_cleared() {
    let (mut m, probe, _) = ramp(Wiring::Standard);
    probe.inject(DiagRegister::THERMAL_WARNING);
    let summary = m
        .run_timed(PROFILE, Duration::from_millis(10), Direction::Feed)
        .unwrap();
    assert!(summary.faults.contains(filament_core::Fault::ThermalWarning));
    assert!(probe.clear_count() >= 1);
    assert_eq!(probe.snapshot().latched, 0);
    assert_braked(&probe, Wiring::Standard);
}

/// Driver whose PWM register stops answering after a number of writes.
struct FlakyDriver {
    inner: SimulatedDriver,
    writes_left: u32,
}

impl MotorDriver for FlakyDriver {
    fn configure(
        &mut self,
        bridge: HalfBridge,
        output: BridgeOutput,
        pwm: PwmChannel,
    ) -> Result<(), BoxError> {
        self.inner.configure(bridge, output, pwm)
    }
    fn set_duty(&mut self, duty: u8) -> Result<(), BoxError> {
        if self.writes_left == 0 {
            return Err(Box::new(std::io::Error::other("spi nack")));
        }
        self.writes_left -= 1;
        self.inner.set_duty(duty)
    }
    fn diagnosis(&mut self) -> Result<DiagRegister, BoxError> {
        self.inner.diagnosis()
    }
    fn clear_errors(&mut self) -> Result<(), BoxError> {
        self.inner.clear_errors()
    }
}

#[test]
fn driver_error_brakes_and_propagates() {
    let inner = SimulatedDriver::new();
    let probe = inner.probe();
    let driver = FlakyDriver {
        inner,
        // begin() writes one zero duty
        writes_left: 6,
    };
    let mut m = MotorRamp::new(driver, MotorCfg::default())
        .unwrap()
        .with_clock(Box::new(TestClock::new()));
    m.begin().unwrap();
    let err = m
        .run_timed(PROFILE, Duration::from_millis(10), Direction::Feed)
        .unwrap_err();
    assert!(err.chain().any(|c| c.to_string().contains("spi nack")));
    assert_braked(&probe, Wiring::Standard);
    assert_eq!(m.phase(), RampPhase::Braking);
}
