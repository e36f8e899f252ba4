//! Lockout window and the buzzer/lights drain that precedes a reset.

use core::time::Duration;

use crate::clock::Instant;
use crate::weapons::timing::BUZZER_GRACE;

/// Lock flag, unlock deadline and the reset drain state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LockoutController {
    lock: Option<LockState>,
    reset_deadline: Option<Instant>,
    buzzer: bool,
}

/// Lock started by the first confirmed touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockState {
    pub started_at: Instant,
    pub duration: Duration,
    pub unlock_deadline: Instant,
}

impl LockoutController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lock: None,
            reset_deadline: None,
            buzzer: false,
        }
    }

    /// Starts the lockout window. A running lock is never restarted.
    pub fn start_lock(&mut self, now: Instant, duration: Duration) {
        if self.lock.is_none() {
            self.lock = Some(LockState {
                started_at: now,
                duration,
                unlock_deadline: now + duration,
            });
        }
    }

    /// `true` once the lockout window has elapsed: no new touch may register.
    #[must_use]
    pub fn is_locked(&self, now: Instant) -> bool {
        self.lock
            .is_some_and(|lock| now >= lock.unlock_deadline)
    }

    #[must_use]
    pub const fn lock(&self) -> Option<LockState> {
        self.lock
    }

    #[must_use]
    pub const fn lock_started(&self) -> bool {
        self.lock.is_some()
    }

    /// Two-phase drain run once the machine is locked.
    ///
    /// The first call fixes the reset deadline so lights stay up for
    /// `lights_duration` after the touch. Past the deadline a sounding buzzer
    /// is silenced and the lights get [`BUZZER_GRACE`] more; only a silent
    /// buzzer lets the reset through.
    pub fn ok_to_reset(&mut self, now: Instant, lights_duration: Duration) -> bool {
        let Some(deadline) = self.reset_deadline else {
            // Measured from the moment the lock engaged, not from this tick.
            let (engaged_at, lock_duration) = self
                .lock
                .map_or((now, Duration::ZERO), |lock| (lock.unlock_deadline, lock.duration));
            self.reset_deadline = Some(engaged_at + lights_duration.saturating_sub(lock_duration));
            return false;
        };

        if now > deadline {
            if !self.buzzer {
                return true;
            }
            self.buzzer = false;
            self.reset_deadline = Some(now + BUZZER_GRACE);
        }
        false
    }

    #[must_use]
    pub const fn reset_deadline(&self) -> Option<Instant> {
        self.reset_deadline
    }

    /// `true` once the lights have been shown for their full duration.
    #[must_use]
    pub fn reset_due(&self, now: Instant) -> bool {
        self.reset_deadline.is_some_and(|deadline| now > deadline)
    }

    pub fn request_buzzer(&mut self) {
        self.buzzer = true;
    }

    pub fn silence_buzzer(&mut self) {
        self.buzzer = false;
    }

    #[must_use]
    pub const fn buzzer(&self) -> bool {
        self.buzzer
    }

    /// Clears lock, drain and buzzer.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
