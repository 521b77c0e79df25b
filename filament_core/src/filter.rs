//! State-driven weight filter.
//!
//! `filter` is a pure function of the tracker state, the baseline reading and
//! the new reading; the tracker feeds it and stores the outcome.

use crate::status::TrackerState;

/// Thresholds of the per-state filter, in grams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterThresholds {
    /// RUN: a delta at least this large is an extruder tension event.
    pub tension_g: f32,
    /// LOAD: largest backward jump accepted as a real reading.
    pub max_delta_in_range_g: f32,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            tension_g: 100.0,
            max_delta_in_range_g: 10.0,
        }
    }
}

/// New `(prev, last)` pair and the tension flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOutcome {
    pub prev: f32,
    pub last: f32,
    pub extruder_tension: bool,
}

impl FilterOutcome {
    #[inline]
    fn settled(v: f32) -> Self {
        Self {
            prev: v,
            last: v,
            extruder_tension: false,
        }
    }
}

/// Apply the filter policy of `state` to a new reading.
///
/// - `None`: both readings forced to zero.
/// - `Ready`: reading accepted as is.
/// - `Run`: `|cur - prev| >= tension_g` raises the tension flag and keeps the
///   baseline; otherwise the baseline advances to `cur`.
/// - `Load`: a drop of more than `max_delta_in_range_g` below the baseline is
///   noise and reverts to the baseline; anything else becomes the baseline.
pub fn filter(state: TrackerState, prev: f32, cur: f32, t: &FilterThresholds) -> FilterOutcome {
    match state {
        TrackerState::None => FilterOutcome::settled(0.0),
        TrackerState::Ready => FilterOutcome::settled(cur),
        TrackerState::Run => {
            if (cur - prev).abs() >= t.tension_g {
                FilterOutcome {
                    prev,
                    last: cur,
                    extruder_tension: true,
                }
            } else {
                FilterOutcome::settled(cur)
            }
        }
        TrackerState::Load => {
            if prev - cur > t.max_delta_in_range_g {
                FilterOutcome::settled(prev)
            } else {
                FilterOutcome::settled(cur)
            }
        }
    }
}
