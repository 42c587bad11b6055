//! Session Clock
//!
//! The controller only ever asks "what time is it"; tests drive a
//! [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock independent system time
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Jump to `elapsed` after creation
    pub fn set(&self, elapsed: Duration) {
        self.elapsed_nanos
            .store(elapsed.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// Whole seconds left until `deadline`, rounded up, zero once passed
pub fn seconds_until(deadline: Instant, now: Instant) -> u64 {
    ceil_seconds(deadline.saturating_duration_since(now))
}

/// `d` in whole seconds, rounded up
pub fn ceil_seconds(d: Duration) -> u64 {
    ((d.as_nanos() + 999_999_999) / 1_000_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now() - start, Duration::from_millis(1500));

        clock.set(Duration::from_secs(10));
        assert_eq!(clock.now() - start, Duration::from_secs(10));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_secs(2));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_seconds_until_rounds_up() {
        let clock = ManualClock::new();
        let deadline = clock.now() + Duration::from_secs(3);

        assert_eq!(seconds_until(deadline, clock.now()), 3);
        clock.advance(Duration::from_millis(1));
        assert_eq!(seconds_until(deadline, clock.now()), 3);
        clock.set(Duration::from_millis(2000));
        assert_eq!(seconds_until(deadline, clock.now()), 1);
        clock.set(Duration::from_millis(2999));
        assert_eq!(seconds_until(deadline, clock.now()), 1);
        clock.set(Duration::from_millis(3000));
        assert_eq!(seconds_until(deadline, clock.now()), 0);
        clock.set(Duration::from_secs(60));
        assert_eq!(seconds_until(deadline, clock.now()), 0);
    }

    #[test]
    fn test_ceil_seconds() {
        assert_eq!(ceil_seconds(Duration::ZERO), 0);
        assert_eq!(ceil_seconds(Duration::from_nanos(1)), 1);
        assert_eq!(ceil_seconds(Duration::from_secs(210)), 210);
        assert_eq!(ceil_seconds(Duration::from_millis(2500)), 3);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
