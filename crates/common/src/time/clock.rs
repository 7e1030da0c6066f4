//! Clock abstraction for testability
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use sprintsync_common::time::{Clock, MockClock};
//!
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(5));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Trait for time operations to enable testing
///
/// `now` is monotonic and used for ages and deadlines; `utc_now` is wall
/// clock and used for entry timestamps.
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current wall clock time
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient sharing
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        (**self).utc_now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed counter, so a test can hand one clone to the
/// code under test and advance time through another.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    start_utc: DateTime<Utc>,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock whose wall time starts at the UNIX epoch
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Create a new mock clock with a specific wall clock start
    pub fn starting_at(start_utc: DateTime<Utc>) -> Self {
        Self { start: Instant::now(), start_utc, elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Advance the mock clock by milliseconds (convenience method)
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or_default();
        self.start_utc + elapsed
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn mock_clock_advances_both_timelines() {
        let start = Utc.with_ymd_and_hms(2024, 1, 14, 9, 0, 0).unwrap();
        let clock = MockClock::starting_at(start);
        let before = clock.now();

        clock.advance_millis(1_500);

        assert_eq!(clock.now().duration_since(before), Duration::from_millis(1_500));
        assert_eq!(clock.utc_now(), start + chrono::Duration::milliseconds(1_500));
    }

    #[test]
    fn clones_share_elapsed_time() {
        let clock = MockClock::new();
        let shared = clock.clone();
        shared.advance(Duration::from_secs(3));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn arc_clock_delegates() {
        let clock = Arc::new(MockClock::new());
        let start = clock.now();
        clock.advance(Duration::from_secs(1));
        assert_eq!(Clock::now(&clock).duration_since(start), Duration::from_secs(1));
    }
}
