//! Debounce primitives used by every weapon state machine.
//!
//! [`DebounceTimer`] confirms that a condition held continuously for a required
//! duration. The result is latched on each [`DebounceTimer::update`] so several
//! reads inside one scan tick always agree with each other; nothing here looks
//! at the clock outside of `update` and [`DebounceTimer::apply_margin_once`].

mod double;

pub use double::{DoubleDebouncer, DoublePhase};

use core::time::Duration;

use crate::clock::Instant;

/// Continuous-condition timer with an optional Dos Santos margin and an
/// "almost OK" pre-trigger window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DebounceTimer {
    required: Duration,
    started_at: Option<Instant>,
    last_result: bool,
    /// Margin subtracted automatically the first time the timer arms.
    arming_margin: Duration,
    applied_margin: Option<Duration>,
    almost_ok_window: Duration,
    almost_ok: bool,
}

impl DebounceTimer {
    /// Creates an idle timer that confirms after `required`.
    #[must_use]
    pub const fn new(required: Duration) -> Self {
        Self {
            required,
            started_at: None,
            last_result: false,
            arming_margin: Duration::ZERO,
            applied_margin: None,
            almost_ok_window: Duration::ZERO,
            almost_ok: false,
        }
    }

    /// Enables the "almost OK" flag for the final `window` before confirmation.
    #[must_use]
    pub const fn with_almost_ok_window(mut self, window: Duration) -> Self {
        self.almost_ok_window = window;
        self
    }

    /// Feeds one sample. Returns the latched result.
    pub fn update(&mut self, condition: bool, now: Instant) -> bool {
        if !condition {
            self.started_at = None;
            self.last_result = false;
            self.almost_ok = false;
            return false;
        }

        if self.started_at.is_none() {
            self.started_at = Some(now);
            if !self.arming_margin.is_zero() && self.applied_margin.is_none() {
                self.applied_margin = Some(self.arming_margin);
            }
        }

        self.evaluate(now);
        self.last_result
    }

    /// Latched result of the most recent evaluation.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.last_result
    }

    /// `true` while the timer runs and sits inside the pre-trigger window.
    #[must_use]
    pub const fn is_almost_ok(&self) -> bool {
        self.almost_ok
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Timestamp of the sample that armed the timer.
    #[must_use]
    pub const fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Required duration with any applied margin removed.
    #[must_use]
    pub fn effective_required(&self) -> Duration {
        match self.applied_margin {
            Some(margin) => self.required.saturating_sub(margin),
            None => self.required,
        }
    }

    /// Configured duration before margin correction.
    #[must_use]
    pub const fn required(&self) -> Duration {
        self.required
    }

    /// Stops the timer and clears the latch and margin flag.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.last_result = false;
        self.applied_margin = None;
        self.almost_ok = false;
    }

    /// Resets and replaces the required duration.
    pub fn reset_with(&mut self, required: Duration) {
        self.reset();
        self.required = required;
    }

    /// Changes the required duration without disturbing a running count.
    ///
    /// The latch is only re-evaluated on the next `update`.
    pub fn set_required_duration(&mut self, required: Duration) {
        self.required = required;
    }

    /// Margin subtracted automatically the first time the timer arms after a reset.
    pub fn set_margin(&mut self, margin: Duration) {
        self.arming_margin = margin;
    }

    /// Subtracts `margin` once. With `advance` set, a running timer is
    /// re-evaluated immediately so a count already in progress benefits.
    /// Further calls do nothing until [`DebounceTimer::reset`].
    pub fn apply_margin_once(&mut self, margin: Duration, advance: bool, now: Instant) -> bool {
        if self.applied_margin.is_some() {
            return self.last_result;
        }

        self.applied_margin = Some(margin);
        if advance && self.started_at.is_some() {
            self.evaluate(now);
        }
        self.last_result
    }

    fn evaluate(&mut self, now: Instant) {
        let Some(started_at) = self.started_at else {
            return;
        };

        let elapsed = now.saturating_duration_since(started_at);
        let required = self.effective_required();
        self.last_result = elapsed >= required;
        self.almost_ok = !self.last_result
            && !self.almost_ok_window.is_zero()
            && elapsed.saturating_add(self.almost_ok_window) >= required;
    }
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(micros: u64) -> Instant {
        Instant::from_micros(micros)
    }

    #[test]
    fn confirms_exactly_at_required_duration() {
        let required = Duration::from_micros(13_500);
        let mut timer = DebounceTimer::new(required);
        let start = 1_000;

        for offset in (0..13_500).step_by(140) {
            assert!(!timer.update(true, at(start + offset)), "early at {offset}");
        }
        assert!(timer.update(true, at(start + 13_500)));
        assert!(timer.update(true, at(start + 20_000)));

        assert!(!timer.update(false, at(start + 20_140)));
        assert!(!timer.is_ok());
        assert!(!timer.is_running());
    }

    #[test]
    fn is_ok_does_not_consult_the_clock() {
        let mut timer = DebounceTimer::new(Duration::from_micros(100));
        timer.update(true, at(10));
        timer.update(true, at(50));
        assert!(!timer.is_ok());
        // No update at a later time: the latch stays put.
        assert!(!timer.is_ok());
        timer.update(true, at(110));
        assert!(timer.is_ok());
    }

    #[test]
    fn timestamp_zero_is_a_valid_start() {
        let mut timer = DebounceTimer::new(Duration::from_micros(120));
        assert!(!timer.update(true, Instant::ZERO));
        assert!(timer.is_running());
        assert!(timer.update(true, at(120)));
    }

    #[test]
    fn margin_shifts_trigger_once() {
        let mut timer = DebounceTimer::new(Duration::from_micros(6_000));
        timer.update(true, at(0));
        timer.update(true, at(5_700));
        assert!(!timer.apply_margin_once(Duration::from_micros(150), true, at(5_800)));
        assert!(timer.update(true, at(5_850)));
        assert_eq!(timer.effective_required(), Duration::from_micros(5_850));

        // Second call is a no-op.
        timer.apply_margin_once(Duration::from_micros(1_000), true, at(5_850));
        assert_eq!(timer.effective_required(), Duration::from_micros(5_850));

        timer.reset();
        assert_eq!(timer.effective_required(), Duration::from_micros(6_000));
        timer.apply_margin_once(Duration::from_micros(1_000), false, at(0));
        assert_eq!(timer.effective_required(), Duration::from_micros(5_000));
    }

    #[test]
    fn margin_without_advance_waits_for_next_update() {
        let mut timer = DebounceTimer::new(Duration::from_micros(1_000));
        timer.update(true, at(0));
        timer.update(true, at(950));
        assert!(!timer.apply_margin_once(Duration::from_micros(100), false, at(950)));
        assert!(timer.update(true, at(960)));
    }

    #[test]
    fn arming_margin_applies_on_each_fresh_arm() {
        let mut timer = DebounceTimer::new(Duration::from_micros(6_000));
        timer.set_margin(Duration::from_micros(150));
        timer.update(true, at(100));
        assert!(timer.update(true, at(5_950)));

        timer.reset();
        timer.update(true, at(10_000));
        assert!(!timer.update(true, at(15_849)));
        assert!(timer.update(true, at(15_850)));
    }

    #[test]
    fn shortening_keeps_the_running_count() {
        let mut timer = DebounceTimer::new(Duration::from_micros(13_500));
        timer.update(true, at(0));
        timer.update(true, at(13_000));
        timer.set_required_duration(Duration::from_micros(13_350));
        assert!(timer.is_running());
        assert!(!timer.is_ok());
        assert!(timer.update(true, at(13_350)));
    }

    #[test]
    fn almost_ok_window_precedes_confirmation() {
        let mut timer = DebounceTimer::new(Duration::from_micros(1_000))
            .with_almost_ok_window(Duration::from_micros(200));
        timer.update(true, at(0));
        assert!(!timer.is_almost_ok());
        timer.update(true, at(799));
        assert!(!timer.is_almost_ok());
        timer.update(true, at(800));
        assert!(timer.is_almost_ok());
        timer.update(true, at(1_000));
        assert!(timer.is_ok());
        assert!(!timer.is_almost_ok());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut timer = DebounceTimer::new(Duration::from_micros(500));
        timer.set_margin(Duration::from_micros(50));
        timer.update(true, at(0));
        timer.update(true, at(600));
        timer.reset();

        let mut fresh = DebounceTimer::new(Duration::from_micros(500));
        fresh.set_margin(Duration::from_micros(50));
        assert_eq!(timer, fresh);
    }
}
