//! Connector lines, analog channels and the fixed set of measurable paths.
//!
//! Every measurement drives one connector line high, pulls a second one low
//! and floats the rest; the low side's analog input then reads the divider
//! formed by the path under test.

use core::fmt;

/// Fencer side on the scoring apparatus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    const fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Pair of values indexed by [`Side`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PerSide<T> {
    values: [T; 2],
}

impl<T> PerSide<T> {
    #[must_use]
    pub const fn new(left: T, right: T) -> Self {
        Self {
            values: [left, right],
        }
    }

    #[must_use]
    pub fn get(&self, side: Side) -> &T {
        &self.values[side.index()]
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        &mut self.values[side.index()]
    }
}

impl<T: Copy> PerSide<T> {
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self {
            values: [value, value],
        }
    }

    pub fn set(&mut self, side: Side, value: T) {
        self.values[side.index()] = value;
    }

    #[must_use]
    pub fn left(&self) -> T {
        self.values[0]
    }

    #[must_use]
    pub fn right(&self) -> T {
        self.values[1]
    }
}

impl PerSide<bool> {
    #[must_use]
    pub fn both(&self) -> bool {
        self.values[0] && self.values[1]
    }

    #[must_use]
    pub fn either(&self) -> bool {
        self.values[0] || self.values[1]
    }
}

/// The seven connector lines (A/B/C per fencer plus the piste).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Line {
    A(Side),
    B(Side),
    C(Side),
    Piste,
}

impl Line {
    /// Bit assigned to the line in [`DriveConfig`] masks.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Line::A(Side::Left) => 0x01,
            Line::B(Side::Left) => 0x02,
            Line::C(Side::Left) => 0x04,
            Line::A(Side::Right) => 0x08,
            Line::B(Side::Right) => 0x10,
            Line::C(Side::Right) => 0x20,
            Line::Piste => 0x40,
        }
    }

    /// Analog input wired to the line. The A lines are drive-only.
    #[must_use]
    pub const fn channel(self) -> Option<AnalogChannel> {
        match self {
            Line::A(_) => None,
            Line::B(side) => Some(AnalogChannel::B(side)),
            Line::C(side) => Some(AnalogChannel::C(side)),
            Line::Piste => Some(AnalogChannel::Piste),
        }
    }
}

/// ADC inputs available on the connector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnalogChannel {
    B(Side),
    C(Side),
    Piste,
}

impl AnalogChannel {
    pub const ALL: [AnalogChannel; 5] = [
        AnalogChannel::B(Side::Left),
        AnalogChannel::B(Side::Right),
        AnalogChannel::C(Side::Left),
        AnalogChannel::C(Side::Right),
        AnalogChannel::Piste,
    ];

    /// Connector line the channel samples.
    #[must_use]
    pub const fn line(self) -> Line {
        match self {
            AnalogChannel::B(side) => Line::B(side),
            AnalogChannel::C(side) => Line::C(side),
            AnalogChannel::Piste => Line::Piste,
        }
    }
}

impl fmt::Display for AnalogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalogChannel::B(Side::Left) => f.write_str("bl"),
            AnalogChannel::B(Side::Right) => f.write_str("br"),
            AnalogChannel::C(Side::Left) => f.write_str("cl"),
            AnalogChannel::C(Side::Right) => f.write_str("cr"),
            AnalogChannel::Piste => f.write_str("piste"),
        }
    }
}

/// Direction and level masks applied to the line drivers before a conversion.
///
/// A set `direction` bit leaves the line floating (input); a cleared bit makes
/// it an output driven to the matching `values` bit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DriveConfig {
    pub direction: u8,
    pub values: u8,
}

impl DriveConfig {
    /// Every line floating.
    pub const RELEASED: Self = Self {
        direction: 0xFF,
        values: 0x00,
    };

    /// Drives `high` high and `low` low, leaving everything else floating.
    #[must_use]
    pub const fn between(high: Line, low: Line) -> Self {
        Self {
            direction: 0xFF & !(high.bit() | low.bit()),
            values: high.bit(),
        }
    }

    /// Combines two configurations so both paths are driven at once.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            direction: self.direction & other.direction,
            values: self.values | other.values,
        }
    }

    /// Returns `true` when `line` is an output driven high.
    #[must_use]
    pub const fn drives_high(self, line: Line) -> bool {
        self.direction & line.bit() == 0 && self.values & line.bit() != 0
    }

    /// Returns `true` when `line` is an output driven low.
    #[must_use]
    pub const fn drives_low(self, line: Line) -> bool {
        self.direction & line.bit() == 0 && self.values & line.bit() == 0
    }
}

/// Physical two-line measurements available on the connector.
///
/// Sided variants are named from the point of view of the fencer whose A line
/// is driven.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Path {
    /// Own A to own B: the foil tip switch, sabre body-wire continuity.
    TipCircuit(Side),
    /// Own A to own C: the epee tip circuit.
    OwnLame(Side),
    /// Own A to the opponent's C: blade on the opponent's lamé.
    OpponentLame(Side),
    /// Own A to the opponent's B: blade on the opponent's guard.
    OpponentGuard(Side),
    /// Own A to the piste.
    Piste(Side),
    /// Own B and own A together against own C.
    LameLeak(Side),
    /// Right B to left B: blade-on-blade contact.
    BladeContact,
}

/// Number of entries in [`Path::ALL`].
pub const PATH_COUNT: usize = 13;

impl Path {
    pub const ALL: [Path; PATH_COUNT] = [
        Path::TipCircuit(Side::Left),
        Path::TipCircuit(Side::Right),
        Path::OwnLame(Side::Left),
        Path::OwnLame(Side::Right),
        Path::OpponentLame(Side::Left),
        Path::OpponentLame(Side::Right),
        Path::OpponentGuard(Side::Left),
        Path::OpponentGuard(Side::Right),
        Path::Piste(Side::Left),
        Path::Piste(Side::Right),
        Path::LameLeak(Side::Left),
        Path::LameLeak(Side::Right),
        Path::BladeContact,
    ];

    /// Stable position of the path in [`Path::ALL`] and threshold tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Path::TipCircuit(side) => side.index(),
            Path::OwnLame(side) => 2 + side.index(),
            Path::OpponentLame(side) => 4 + side.index(),
            Path::OpponentGuard(side) => 6 + side.index(),
            Path::Piste(side) => 8 + side.index(),
            Path::LameLeak(side) => 10 + side.index(),
            Path::BladeContact => 12,
        }
    }

    /// Drive configuration and sensed channel for the path.
    #[must_use]
    pub const fn wiring(self) -> (DriveConfig, AnalogChannel) {
        match self {
            Path::TipCircuit(side) => (
                DriveConfig::between(Line::A(side), Line::B(side)),
                AnalogChannel::B(side),
            ),
            Path::OwnLame(side) => (
                DriveConfig::between(Line::A(side), Line::C(side)),
                AnalogChannel::C(side),
            ),
            Path::OpponentLame(side) => (
                DriveConfig::between(Line::A(side), Line::C(side.opponent())),
                AnalogChannel::C(side.opponent()),
            ),
            Path::OpponentGuard(side) => (
                DriveConfig::between(Line::A(side), Line::B(side.opponent())),
                AnalogChannel::B(side.opponent()),
            ),
            Path::Piste(side) => (
                DriveConfig::between(Line::A(side), Line::Piste),
                AnalogChannel::Piste,
            ),
            Path::LameLeak(side) => (
                DriveConfig::between(Line::B(side), Line::C(side))
                    .merge(DriveConfig::between(Line::A(side), Line::C(side))),
                AnalogChannel::C(side),
            ),
            Path::BladeContact => (
                DriveConfig::between(Line::B(Side::Right), Line::B(Side::Left)),
                AnalogChannel::B(Side::Left),
            ),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::TipCircuit(side) => write!(f, "tip-circuit-{side}"),
            Path::OwnLame(side) => write!(f, "own-lame-{side}"),
            Path::OpponentLame(side) => write!(f, "opponent-lame-{side}"),
            Path::OpponentGuard(side) => write!(f, "opponent-guard-{side}"),
            Path::Piste(side) => write!(f, "piste-{side}"),
            Path::LameLeak(side) => write!(f, "lame-leak-{side}"),
            Path::BladeContact => f.write_str("blade-contact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_masks_match_connector_wiring() {
        let (tip_left, channel) = Path::TipCircuit(Side::Left).wiring();
        assert_eq!(tip_left, DriveConfig { direction: 0xFC, values: 0x01 });
        assert_eq!(channel, AnalogChannel::B(Side::Left));

        let (guard_right, channel) = Path::OpponentGuard(Side::Right).wiring();
        assert_eq!(guard_right, DriveConfig { direction: 0xF5, values: 0x08 });
        assert_eq!(channel, AnalogChannel::B(Side::Left));

        let (piste_left, _) = Path::Piste(Side::Left).wiring();
        assert_eq!(piste_left.direction, 0xBE);

        let (parry, channel) = Path::BladeContact.wiring();
        assert_eq!(parry, DriveConfig { direction: 0xED, values: 0x10 });
        assert_eq!(channel, AnalogChannel::B(Side::Left));
    }

    #[test]
    fn lame_leak_merges_both_drives() {
        let (config, channel) = Path::LameLeak(Side::Left).wiring();
        assert_eq!(config, DriveConfig { direction: 0xF8, values: 0x03 });
        assert_eq!(channel, AnalogChannel::C(Side::Left));
        assert!(config.drives_high(Line::A(Side::Left)));
        assert!(config.drives_high(Line::B(Side::Left)));
        assert!(config.drives_low(Line::C(Side::Left)));
        assert!(!config.drives_low(Line::Piste));
    }

    #[test]
    fn sensed_channel_is_the_low_line() {
        for path in Path::ALL {
            let (config, channel) = path.wiring();
            assert!(config.drives_low(channel.line()), "{path}");
        }
    }

    #[test]
    fn indices_are_dense_and_unique() {
        for (position, path) in Path::ALL.iter().enumerate() {
            assert_eq!(path.index(), position);
        }
    }
}
