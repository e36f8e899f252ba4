use core::time::Duration;

use crate::clock::Instant;

/// Phase of a [`DoubleDebouncer`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DoublePhase {
    /// Waiting for the condition to assert for `on`.
    #[default]
    WaitingOn,
    /// Confirmed; waiting for the condition to release for `off`.
    WaitingOff,
}

/// Asymmetric two-phase debounce: the signal must hold `on` to assert and
/// stay released for `off` to clear.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DoubleDebouncer {
    on: Duration,
    off: Duration,
    phase: DoublePhase,
    started_at: Option<Instant>,
    last_result: bool,
}

impl DoubleDebouncer {
    #[must_use]
    pub const fn new(on: Duration, off: Duration) -> Self {
        Self {
            on,
            off,
            phase: DoublePhase::WaitingOn,
            started_at: None,
            last_result: false,
        }
    }

    pub fn update(&mut self, condition: bool, now: Instant) -> bool {
        match (self.phase, condition) {
            (DoublePhase::WaitingOn, true) => {
                if self.expired(self.on, now) {
                    self.phase = DoublePhase::WaitingOff;
                    self.last_result = true;
                    self.started_at = None;
                }
            }
            (DoublePhase::WaitingOn, false) => {
                self.started_at = None;
                self.last_result = false;
            }
            (DoublePhase::WaitingOff, false) => {
                if self.expired(self.off, now) {
                    self.phase = DoublePhase::WaitingOn;
                    self.last_result = false;
                    self.started_at = None;
                }
            }
            (DoublePhase::WaitingOff, true) => {
                self.started_at = None;
            }
        }
        self.last_result
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.last_result
    }

    #[must_use]
    pub const fn phase(&self) -> DoublePhase {
        self.phase
    }

    pub fn set_on_duration(&mut self, on: Duration) {
        self.on = on;
    }

    pub fn reset(&mut self) {
        self.phase = DoublePhase::WaitingOn;
        self.started_at = None;
        self.last_result = false;
    }

    fn expired(&mut self, required: Duration, now: Instant) -> bool {
        let started_at = *self.started_at.get_or_insert(now);
        now.saturating_duration_since(started_at) >= required
    }
}
