//! Fixed-period scan pacing.
//!
//! The scheduler never queues up missed work: a late poll runs one scan and
//! counts the periods it skipped. Every timer in the pipeline works from
//! timestamps, so a skipped period costs resolution, not correctness.

use core::time::Duration;

use crate::clock::{Instant, duration_micros};

/// Pacing counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanStats {
    pub ticks: u64,
    pub skipped: u64,
    /// Ticks that started after their due time.
    pub late: u64,
    pub max_lateness: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanScheduler {
    period: Duration,
    next_due: Option<Instant>,
    stats: ScanStats,
}

impl ScanScheduler {
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            stats: ScanStats {
                ticks: 0,
                skipped: 0,
                late: 0,
                max_lateness: Duration::ZERO,
            },
        }
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` when a scan is due at `now`, at most once per call.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            self.next_due = Some(now + self.period);
            self.stats.ticks += 1;
            return true;
        };

        if now < due {
            return false;
        }

        let lateness = now.saturating_duration_since(due);
        let period = duration_micros(self.period).max(1);
        let missed = duration_micros(lateness) / period;
        if !lateness.is_zero() {
            self.stats.late += 1;
            self.stats.max_lateness = self.stats.max_lateness.max(lateness);
        }
        self.stats.skipped += missed;
        self.stats.ticks += 1;
        self.next_due = Some(due + Duration::from_micros((missed + 1) * period));
        true
    }

    /// Runs `scan` if it is due. Returns whether it ran.
    pub fn run_due<F>(&mut self, now: Instant, scan: F) -> bool
    where
        F: FnOnce(Instant),
    {
        let due = self.poll(now);
        if due {
            scan(now);
        }
        due
    }

    /// Deadline of the next scan, `None` before the first poll.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    #[must_use]
    pub const fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Restarts pacing from the next poll.
    pub fn restart(&mut self) {
        self.next_due = None;
    }
}
