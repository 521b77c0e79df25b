//! Test and helper mocks for filament_core

use filament_traits::{BoxError, LoadCell};
use std::collections::VecDeque;

/// Replays a fixed list of raw counts, then repeats the last one.
pub struct ScriptedLoadCell {
    script: VecDeque<i32>,
    last: i32,
}

impl ScriptedLoadCell {
    pub fn new(raw: Vec<i32>) -> Self {
        Self {
            script: raw.into(),
            last: 0,
        }
    }
}

impl LoadCell for ScriptedLoadCell {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }
}

/// A load cell whose data-ready line never goes low.
pub struct FailingLoadCell;

impl LoadCell for FailingLoadCell {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        Err(Box::new(std::io::Error::other("load cell data-ready timeout")))
    }
}
