//! Automatic weapon classification from long-running cross-discipline checks.
//!
//! The active state machine feeds raw readings in through [`WeaponDetector::observe`]
//! and [`WeaponDetector::set_not_connected`]; [`WeaponDetector::evaluate`] runs once per
//! scan before the machine and may pick a different weapon.

use core::fmt;

use crate::clock::Instant;
use crate::debounce::DebounceTimer;
use crate::lights::Lamps;
use crate::probe::{PerSide, Side};
use crate::weapons::timing::{DETECTION_HOLD, DISCONNECTED_FALLBACK, PARTIALLY_DISCONNECTED};
use crate::weapons::{CircuitStatus, WeaponKind};

/// Whether the detector may change the weapon on its own.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum DetectionMode {
    /// Only the operator changes the weapon.
    Manual,
    /// Any confirmed cross-check switches the weapon.
    #[default]
    Auto,
    /// Like `Auto`, but never while a touch is being counted or displayed.
    Hybrid,
}

impl DetectionMode {
    pub const ALL: [DetectionMode; 3] = [
        DetectionMode::Manual,
        DetectionMode::Auto,
        DetectionMode::Hybrid,
    ];

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            DetectionMode::Manual => 0,
            DetectionMode::Auto => 1,
            DetectionMode::Hybrid => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DetectionMode::Manual),
            1 => Some(DetectionMode::Auto),
            2 => Some(DetectionMode::Hybrid),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DetectionMode::Manual => "manual",
            DetectionMode::Auto => "auto",
            DetectionMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Long cross-check fed by the state machines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrossCheck {
    /// Blade A line reaches the side's own C line (epee-style circuit).
    OwnLame(Side),
    /// Blade A line reaches the opponent's lamé.
    OpponentLame(Side),
}

#[derive(Clone, Debug)]
pub struct WeaponDetector {
    mode: DetectionMode,
    own_lame: PerSide<DebounceTimer>,
    opponent_lame: PerSide<DebounceTimer>,
    not_connected: PerSide<bool>,
    all_disconnected: DebounceTimer,
    one_disconnected: DebounceTimer,
    prevent_buzzer: bool,
}

impl WeaponDetector {
    #[must_use]
    pub fn new(mode: DetectionMode) -> Self {
        Self {
            mode,
            own_lame: PerSide::splat(DebounceTimer::new(DETECTION_HOLD)),
            opponent_lame: PerSide::splat(DebounceTimer::new(DETECTION_HOLD)),
            not_connected: PerSide::splat(false),
            all_disconnected: DebounceTimer::new(DISCONNECTED_FALLBACK),
            one_disconnected: DebounceTimer::new(PARTIALLY_DISCONNECTED),
            prevent_buzzer: false,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.mode = mode;
    }

    /// Feeds one reading into a long cross-check timer.
    pub fn observe(&mut self, check: CrossCheck, condition: bool, now: Instant) {
        let timer = match check {
            CrossCheck::OwnLame(side) => self.own_lame.get_mut(side),
            CrossCheck::OpponentLame(side) => self.opponent_lame.get_mut(side),
        };
        timer.update(condition, now);
    }

    /// Records whether the side's body wire currently looks unplugged.
    pub fn set_not_connected(&mut self, side: Side, not_connected: bool) {
        self.not_connected.set(side, not_connected);
    }

    #[must_use]
    pub fn not_connected(&self) -> PerSide<bool> {
        self.not_connected
    }

    /// Buzzer suppression while a side is partly unplugged.
    #[must_use]
    pub const fn prevent_buzzer(&self) -> bool {
        self.prevent_buzzer
    }

    pub fn clear_prevent_buzzer(&mut self) {
        self.prevent_buzzer = false;
    }

    /// `true` while both sides are unplugged and the epee fallback is counting.
    #[must_use]
    pub const fn fallback_pending(&self) -> bool {
        self.all_disconnected.is_running()
    }

    #[must_use]
    pub const fn fallback_confirmed(&self) -> bool {
        self.all_disconnected.is_ok()
    }

    pub fn reset_long_timers(&mut self) {
        for side in Side::BOTH {
            self.own_lame.get_mut(side).reset();
            self.opponent_lame.get_mut(side).reset();
        }
    }

    /// Decides the weapon for this scan. Returns `Some` only when it differs
    /// from `active`.
    ///
    /// `activity` reports a touch being counted or displayed; hybrid mode
    /// holds the current weapon while it is set.
    pub fn evaluate(
        &mut self,
        active: WeaponKind,
        circuits: &CircuitStatus,
        lamps: &Lamps,
        activity: bool,
        now: Instant,
    ) -> Option<WeaponKind> {
        let fallback = match active {
            WeaponKind::Epee => None,
            WeaponKind::Foil | WeaponKind::Sabre => self.track_disconnection(now),
        };
        if fallback.is_some() {
            return fallback;
        }

        match self.mode {
            DetectionMode::Manual => return None,
            DetectionMode::Hybrid if activity => return None,
            DetectionMode::Auto | DetectionMode::Hybrid => {}
        }

        let own_lame = self.own_lame.left().is_ok() && self.own_lame.right().is_ok();
        let opponent_lame =
            self.opponent_lame.left().is_ok() && self.opponent_lame.right().is_ok();
        let tips = circuits.tip_circuit_confirmed;

        let next = match active {
            WeaponKind::Foil if own_lame && tips.both() => Some(WeaponKind::Epee),
            WeaponKind::Foil if opponent_lame && !tips.either() => Some(WeaponKind::Sabre),
            WeaponKind::Epee if opponent_lame => {
                // The fallback timer is only cleared on the way out of epee.
                self.all_disconnected.reset();
                if lamps.orange.both() {
                    Some(WeaponKind::Sabre)
                } else {
                    Some(WeaponKind::Foil)
                }
            }
            WeaponKind::Sabre if opponent_lame && lamps.white.both() => Some(WeaponKind::Foil),
            WeaponKind::Sabre if own_lame && tips.both() => Some(WeaponKind::Epee),
            WeaponKind::Foil | WeaponKind::Epee | WeaponKind::Sabre => None,
        };

        if next.is_some() {
            self.reset_long_timers();
            self.prevent_buzzer = false;
        }
        next
    }

    /// Foil and sabre only: updates buzzer suppression and the epee fallback.
    fn track_disconnection(&mut self, now: Instant) -> Option<WeaponKind> {
        if !self.not_connected.either() {
            self.prevent_buzzer = false;
            self.one_disconnected.reset();
            self.all_disconnected.reset();
            return None;
        }

        self.prevent_buzzer = self.one_disconnected.update(true, now);
        if self.not_connected.both() {
            self.all_disconnected.update(true, now);
        } else {
            self.all_disconnected.reset();
        }

        if self.all_disconnected.is_ok() {
            self.prevent_buzzer = false;
            self.one_disconnected.reset();
            if self.mode != DetectionMode::Manual {
                self.reset_long_timers();
                return Some(WeaponKind::Epee);
            }
        }
        None
    }
}

impl Default for WeaponDetector {
    fn default() -> Self {
        Self::new(DetectionMode::default())
    }
}
