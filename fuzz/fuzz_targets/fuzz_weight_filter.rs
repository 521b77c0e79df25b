#![no_main]
use libfuzzer_sys::{arbitrary, fuzz_target};

use filament_core::filter::{FilterThresholds, filter};
use filament_core::TrackerState;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    state: u8,
    prev: f32,
    cur: f32,
    tension: f32,
    max_delta: f32,
}

fuzz_target!(|inp: Input| {
    let state = match inp.state % 4 {
        0 => TrackerState::None,
        1 => TrackerState::Ready,
        2 => TrackerState::Run,
        _ => TrackerState::Load,
    };
    let th = FilterThresholds {
        tension_g: inp.tension,
        max_delta_in_range_g: inp.max_delta,
    };
    let out = filter(state, inp.prev, inp.cur, &th);
    if state == TrackerState::None {
        assert_eq!(out.prev, 0.0);
        assert_eq!(out.last, 0.0);
    }
    if state != TrackerState::Run {
        assert!(!out.extruder_tension);
    }
});
