//! Calibrated ADC thresholds consumed by the probe.
//!
//! The interactive calibration procedure lives outside the core; it hands us
//! either a finished [`Calibration`] or the measured divider resistances from
//! which [`ResistorDivider`] derives one table per weapon.

use crate::probe::{PATH_COUNT, Path};
use crate::weapons::WeaponKind;

/// Default threshold for tip circuits (raw ADC counts).
pub const DEFAULT_TIP_THRESHOLD: i32 = 1_800;
/// Default threshold for non-tip circuits (raw ADC counts).
pub const DEFAULT_NON_TIP_THRESHOLD: i32 = 1_200;
/// Full-scale reading of the 12-bit converter.
pub const ADC_FULL_SCALE: f32 = 4_095.0;
/// Reference voltage of the converter.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;
/// Counts subtracted from every derived threshold.
pub const THRESHOLD_MARGIN: i32 = 25;

/// Electrical family of a measurement; each needs its own threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Circuit {
    Tip,
    NonTip,
}

/// Raw threshold. Values at or below zero mean "not calibrated".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Threshold(i32);

impl Threshold {
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Marker for a path that could not be calibrated.
    #[must_use]
    pub const fn invalid() -> Self {
        Self(-1)
    }

    /// Usable comparison limit, if any.
    #[must_use]
    pub const fn value(self) -> Option<i32> {
        if self.0 > 0 { Some(self.0) } else { None }
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Tip and non-tip thresholds for one path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PathThresholds {
    pub tip: Threshold,
    pub non_tip: Threshold,
}

impl PathThresholds {
    #[must_use]
    pub const fn new(tip: i32, non_tip: i32) -> Self {
        Self {
            tip: Threshold::new(tip),
            non_tip: Threshold::new(non_tip),
        }
    }

    #[must_use]
    pub const fn get(self, circuit: Circuit) -> Threshold {
        match circuit {
            Circuit::Tip => self.tip,
            Circuit::NonTip => self.non_tip,
        }
    }
}

/// Threshold pair for every [`Path`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThresholdTable {
    entries: [PathThresholds; PATH_COUNT],
}

impl ThresholdTable {
    /// Same thresholds on every path.
    #[must_use]
    pub const fn uniform(thresholds: PathThresholds) -> Self {
        Self {
            entries: [thresholds; PATH_COUNT],
        }
    }

    /// Replaces the thresholds of one path.
    #[must_use]
    pub const fn with_path(mut self, path: Path, thresholds: PathThresholds) -> Self {
        self.entries[path.index()] = thresholds;
        self
    }

    #[must_use]
    pub const fn threshold(&self, path: Path, circuit: Circuit) -> Threshold {
        self.entries[path.index()].get(circuit)
    }

    #[must_use]
    pub const fn path(&self, path: Path) -> PathThresholds {
        self.entries[path.index()]
    }

    /// Paths with at least one unusable threshold.
    pub fn invalid_paths(&self) -> impl Iterator<Item = Path> + '_ {
        Path::ALL.into_iter().filter(|path| {
            let entry = self.entries[path.index()];
            entry.tip.value().is_none() || entry.non_tip.value().is_none()
        })
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::uniform(PathThresholds::new(
            DEFAULT_TIP_THRESHOLD,
            DEFAULT_NON_TIP_THRESHOLD,
        ))
    }
}

/// Per-weapon threshold tables handed to the sensor at startup.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Calibration {
    pub foil: ThresholdTable,
    pub epee: ThresholdTable,
    pub sabre: ThresholdTable,
}

impl Calibration {
    /// Uses one table for every weapon.
    #[must_use]
    pub const fn shared(table: ThresholdTable) -> Self {
        Self {
            foil: table,
            epee: table,
            sabre: table,
        }
    }

    #[must_use]
    pub const fn for_weapon(&self, weapon: WeaponKind) -> ThresholdTable {
        match weapon {
            WeaponKind::Foil => self.foil,
            WeaponKind::Epee => self.epee,
            WeaponKind::Sabre => self.sabre,
        }
    }
}

/// Resistances (ohms) that must still read as a closed contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactResistance {
    pub tip_ohms: f32,
    pub non_tip_ohms: f32,
}

impl ContactResistance {
    pub const FOIL: Self = Self {
        tip_ohms: 300.0,
        non_tip_ohms: 450.0,
    };
    pub const EPEE: Self = Self {
        tip_ohms: 250.0,
        non_tip_ohms: 250.0,
    };
    pub const SABRE: Self = Self {
        tip_ohms: 280.0,
        non_tip_ohms: 280.0,
    };

    #[must_use]
    pub const fn for_weapon(weapon: WeaponKind) -> Self {
        match weapon {
            WeaponKind::Foil => Self::FOIL,
            WeaponKind::Epee => Self::EPEE,
            WeaponKind::Sabre => Self::SABRE,
        }
    }
}

/// Measured effective resistances of the sensing divider.
///
/// The sensed voltage for a contact of resistance `R` is
/// `v_drive * r3 / (r1 + R + r3)`; tip circuits see a different series
/// resistance (`r1_tip`) than the other paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResistorDivider {
    pub drive_volts: f32,
    pub r1_ohms: f32,
    pub r1_tip_ohms: f32,
    pub r3_ohms: f32,
}

impl ResistorDivider {
    #[must_use]
    pub const fn new(r1_ohms: f32, r1_tip_ohms: f32, r3_ohms: f32) -> Self {
        Self {
            drive_volts: ADC_REFERENCE_VOLTS,
            r1_ohms,
            r1_tip_ohms,
            r3_ohms,
        }
    }

    /// Raw reading expected for a contact of `resistance_ohms`, minus the margin.
    #[must_use]
    pub fn threshold_for(&self, resistance_ohms: f32, circuit: Circuit) -> Threshold {
        let r1 = match circuit {
            Circuit::Tip => self.r1_tip_ohms,
            Circuit::NonTip => self.r1_ohms,
        };
        if r1 <= 0.0 || self.r3_ohms <= 0.0 || self.drive_volts <= 0.0 {
            return Threshold::invalid();
        }

        let volts = self.drive_volts * self.r3_ohms / (r1 + resistance_ohms + self.r3_ohms);
        let counts = (volts / ADC_REFERENCE_VOLTS) * ADC_FULL_SCALE;
        #[allow(clippy::cast_possible_truncation)]
        let raw = counts as i32;
        Threshold::new(raw - THRESHOLD_MARGIN)
    }

    /// Uniform table for the contact resistances of one weapon.
    #[must_use]
    pub fn table(&self, resistance: ContactResistance) -> ThresholdTable {
        ThresholdTable::uniform(PathThresholds {
            tip: self.threshold_for(resistance.tip_ohms, Circuit::Tip),
            non_tip: self.threshold_for(resistance.non_tip_ohms, Circuit::NonTip),
        })
    }

    /// Full per-weapon calibration.
    #[must_use]
    pub fn calibration(&self) -> Calibration {
        Calibration {
            foil: self.table(ContactResistance::FOIL),
            epee: self.table(ContactResistance::EPEE),
            sabre: self.table(ContactResistance::SABRE),
        }
    }
}
