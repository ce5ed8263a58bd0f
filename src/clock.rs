use chrono::Utc;

/// Epoch-millisecond time source used for scheduling keys and rate windows
/// A trait rather than a bare function so that tests can
/// supply a deterministic clock without touching wall time.
pub trait Clock: Send + Sync {
    /// Current time, in milliseconds since the Unix epoch. Implementations
    /// must be monotonic across a single process: callers use the returned
    /// value as a Redis sorted-set score, and a backward jump would let a
    /// stale rate-limit score outlive its interval.
    fn now_millis(&self) -> i64;
}

/// The default clock: wall-clock time via `chrono::Utc::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A fixed-or-stepped clock for tests that need to control the passage of
/// time precisely (e.g. asserting an interval boundary to the millisecond).
#[cfg(test)]
pub struct FixedClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl FixedClock {
    pub fn new(start_millis: i64) -> Self {
        FixedClock(std::sync::atomic::AtomicI64::new(start_millis))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now_millis(), 1000);
        clock.advance(500);
        assert_eq!(clock.now_millis(), 1500);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn system_clock_is_increasing() {
        let clock = SystemClock;
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }
}
