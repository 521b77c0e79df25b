use std::time::{Duration, Instant};

/// Time source for the blocking motor ramps.
///
/// The ramps sleep once per duty step and once for the hold; swapping the
/// clock lets tests run them instantly.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

/// Wall clock: `Instant::now` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::{Clock, Duration, Instant};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Log {
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    /// Virtual clock: `sleep` records the duration and moves time forward
    /// without blocking. Clones share the same timeline.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        log: Arc<Mutex<Log>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                log: Arc::new(Mutex::new(Log::default())),
            }
        }

        pub fn advance(&self, d: Duration) {
            if let Ok(mut log) = self.log.lock() {
                log.elapsed = log.elapsed.saturating_add(d);
            }
        }

        /// Virtual time since construction.
        pub fn elapsed(&self) -> Duration {
            self.log.lock().map(|l| l.elapsed).unwrap_or_default()
        }

        /// Every duration passed to `sleep`, in call order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.log.lock().map(|l| l.sleeps.clone()).unwrap_or_default()
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            if let Ok(mut log) = self.log.lock() {
                log.sleeps.push(d);
            }
            self.advance(d);
        }
    }

}
