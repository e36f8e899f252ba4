//! Monotonic microsecond timestamps shared by the scan pipeline.
//!
//! Firmware feeds these from the Embassy time driver, the emulator from a
//! simulated clock. All debounce and lockout arithmetic happens on this type so
//! the core never depends on a concrete time source.

use core::fmt;
use core::ops::Add;
use core::time::Duration;

/// Canonical timestamp units for scan bookkeeping (microseconds since boot).
pub type TimestampMicros = u64;

/// Point on the monotonic scan clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Instant(TimestampMicros);

impl Instant {
    /// Clock origin.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_micros(micros: TimestampMicros) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    #[must_use]
    pub const fn as_micros(self) -> TimestampMicros {
        self.0
    }

    /// Returns the elapsed time since `earlier`, clamping to zero when the
    /// clock appears to run backwards.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// Adds `duration`, saturating at the end of the clock range.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_micros(duration)))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Source of scan timestamps.
pub trait MonotonicClock {
    fn now(&self) -> Instant;
}

/// Converts a duration into whole microseconds, saturating on overflow.
#[must_use]
pub fn duration_micros(duration: Duration) -> TimestampMicros {
    TimestampMicros::try_from(duration.as_micros()).unwrap_or(TimestampMicros::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates_when_clock_runs_backwards() {
        let later = Instant::from_micros(500);
        let earlier = Instant::from_micros(900);
        assert_eq!(later.saturating_duration_since(earlier), Duration::ZERO);
        assert_eq!(
            earlier.saturating_duration_since(later),
            Duration::from_micros(400)
        );
    }

    #[test]
    fn adding_durations_saturates() {
        let near_end = Instant::from_micros(u64::MAX - 5);
        assert_eq!(
            (near_end + Duration::from_secs(1)).as_micros(),
            u64::MAX
        );
        assert_eq!(
            Instant::from_millis(2) + Duration::from_micros(140),
            Instant::from_micros(2_140)
        );
    }
}
