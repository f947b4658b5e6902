//! Injectable wall-clock time source.
//!
//! Both the lifecycle operations and the expiry sweep decide window expiry by
//! consulting a [`Clock`] rather than calling `Utc::now()` directly, so tests
//! can drive time deterministically without mocking the system clock. The
//! delay window itself is a persisted deadline, not a live timer; the clock is
//! only read at the moment a decision is made.

use sea_orm::prelude::DateTimeUtc;

/// Supplies monotonically non-decreasing wall-clock timestamps.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTimeUtc;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTimeUtc {
        chrono::Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_non_decreasing() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
