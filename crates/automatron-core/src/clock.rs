//! Time source for playback pauses

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Monotonic time since the clock was created.
    fn now(&self) -> Duration;

    fn sleep(&self, d: Duration);

    fn sleep_secs(&self, secs: f64) {
        if secs > 0.0 {
            self.sleep(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX));
        }
    }
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Clock whose `sleep` only advances a counter.
///
/// Clones share the same time, so a test can hand one clone to the player
/// and keep another to read the elapsed virtual time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        *self.now.lock() += d;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, d: Duration) {
        self.sleeps.lock().push(d);
        self.advance(d);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d)
    }
}
