//! Light bitmask published to displays and the throttled composer that builds it.

use core::fmt;

use crate::clock::Instant;
use crate::probe::{PerSide, Side};
use crate::weapons::WeaponKind;
use crate::weapons::timing::INDICATOR_REFRESH;

/// Bitmask of lamps currently lit. Bit assignments are stable on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct LightState(u8);

impl LightState {
    pub const RED: u8 = 0x80;
    pub const WHITE_LEFT: u8 = 0x40;
    pub const ORANGE_LEFT: u8 = 0x20;
    pub const ORANGE_RIGHT: u8 = 0x10;
    pub const WHITE_RIGHT: u8 = 0x08;
    pub const GREEN: u8 = 0x04;
    pub const BUZZER: u8 = 0x02;
    pub const MIRRORED: u8 = 0x01;

    /// Bits held between indicator refreshes.
    const THROTTLED: u8 = Self::ORANGE_LEFT | Self::ORANGE_RIGHT;
    /// Bits held between indicator refreshes when sabre continuity lights are in play.
    const THROTTLED_SABRE: u8 = Self::THROTTLED | Self::WHITE_LEFT | Self::WHITE_RIGHT;

    pub const OFF: Self = Self(0);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    #[must_use]
    pub const fn with(self, mask: u8, on: bool) -> Self {
        if on {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    #[must_use]
    pub const fn white(side: Side) -> u8 {
        match side {
            Side::Left => Self::WHITE_LEFT,
            Side::Right => Self::WHITE_RIGHT,
        }
    }

    #[must_use]
    pub const fn orange(side: Side) -> u8 {
        match side {
            Side::Left => Self::ORANGE_LEFT,
            Side::Right => Self::ORANGE_RIGHT,
        }
    }

    /// Colored on-target lamp for a side: red on the left, green on the right.
    #[must_use]
    pub const fn colored(side: Side) -> u8 {
        match side {
            Side::Left => Self::RED,
            Side::Right => Self::GREEN,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 8] = [
            (LightState::RED, "red"),
            (LightState::WHITE_LEFT, "white-left"),
            (LightState::ORANGE_LEFT, "orange-left"),
            (LightState::ORANGE_RIGHT, "orange-right"),
            (LightState::WHITE_RIGHT, "white-right"),
            (LightState::GREEN, "green"),
            (LightState::BUZZER, "buzzer"),
            (LightState::MIRRORED, "mirrored"),
        ];

        if self.0 == 0 {
            return f.write_str("off");
        }
        let mut first = true;
        for (mask, name) in NAMES {
            if self.contains(mask) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Lamp requests raised by the weapon state machines during a bout phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Lamps {
    pub red: bool,
    pub green: bool,
    pub white: PerSide<bool>,
    pub orange: PerSide<bool>,
}

impl Lamps {
    /// Latches the colored lamp for `side`.
    pub fn score(&mut self, side: Side) {
        match side {
            Side::Left => self.red = true,
            Side::Right => self.green = true,
        }
    }

    #[must_use]
    pub fn colored(&self, side: Side) -> bool {
        match side {
            Side::Left => self.red,
            Side::Right => self.green,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Builds the published [`LightState`], refreshing fault indicators at most
/// every [`INDICATOR_REFRESH`] so a flaky wire cannot flood observers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LightComposer {
    current: LightState,
    next_indicator_refresh: Option<Instant>,
}

/// Non-lamp inputs to [`LightComposer::compose`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LightInputs {
    pub buzzer: bool,
    pub prevent_buzzer: bool,
    pub mirrored: bool,
}

impl LightComposer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: LightState::OFF,
            next_indicator_refresh: None,
        }
    }

    #[must_use]
    pub const fn current(&self) -> LightState {
        self.current
    }

    /// Recomputes the mask. Returns the new state when it differs from the last one.
    pub fn compose(
        &mut self,
        weapon: WeaponKind,
        lamps: &Lamps,
        inputs: LightInputs,
        now: Instant,
    ) -> Option<LightState> {
        let refresh = self.next_indicator_refresh.is_none_or(|due| now > due);
        let mut next = if refresh {
            self.next_indicator_refresh = Some(now + INDICATOR_REFRESH);
            let mut indicators = LightState::OFF;
            for side in Side::BOTH {
                indicators = indicators.with(LightState::orange(side), *lamps.orange.get(side));
                if weapon == WeaponKind::Sabre {
                    indicators = indicators.with(LightState::white(side), *lamps.white.get(side));
                }
            }
            indicators
        } else {
            let held = match weapon {
                WeaponKind::Sabre => LightState::THROTTLED_SABRE,
                WeaponKind::Foil | WeaponKind::Epee => LightState::THROTTLED,
            };
            LightState::from_bits(self.current.bits() & held)
        };

        next = next
            .with(LightState::RED, lamps.red)
            .with(LightState::GREEN, lamps.green);
        if weapon == WeaponKind::Foil {
            for side in Side::BOTH {
                if *lamps.white.get(side) {
                    next = next.with(LightState::white(side), true);
                }
            }
        }
        next = next
            .with(LightState::BUZZER, inputs.buzzer && !inputs.prevent_buzzer)
            .with(LightState::MIRRORED, inputs.mirrored);

        if next == self.current {
            None
        } else {
            self.current = next;
            Some(next)
        }
    }

    /// Forgets the throttle so the next compose refreshes every indicator.
    pub fn force_refresh(&mut self) {
        self.next_indicator_refresh = None;
    }
}
