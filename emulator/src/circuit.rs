//! Simulated strip wiring behind the [`AnalogFrontEnd`] seam.

use std::collections::BTreeMap;

use scoring_core::calibration::{ADC_FULL_SCALE, ResistorDivider};
use scoring_core::{AnalogChannel, AnalogFrontEnd, ConversionTimeout, DriveConfig, Path};

/// Series resistors fitted on the reference board.
pub const BOARD_DIVIDER: ResistorDivider = ResistorDivider::new(1_000.0, 1_000.0, 1_000.0);

/// Contacts currently closed, each with its resistance.
pub struct SimulatedCircuit {
    divider: ResistorDivider,
    contacts: BTreeMap<usize, (Path, f32)>,
    drive: Option<DriveConfig>,
    conversions: u64,
}

impl SimulatedCircuit {
    pub fn new(divider: ResistorDivider) -> Self {
        Self {
            divider,
            contacts: BTreeMap::new(),
            drive: None,
            conversions: 0,
        }
    }

    pub fn touch(&mut self, path: Path, ohms: f32) {
        self.contacts.insert(path.index(), (path, ohms.max(0.0)));
    }

    /// Returns whether the path was closed.
    pub fn release(&mut self, path: Path) -> bool {
        self.contacts.remove(&path.index()).is_some()
    }

    pub fn release_all(&mut self) {
        self.contacts.clear();
    }

    pub fn contacts(&self) -> impl Iterator<Item = (Path, f32)> + '_ {
        self.contacts.values().copied()
    }

    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Divider output for a contact of `ohms`, in ADC counts.
    fn reading(&self, ohms: f32) -> u16 {
        let r1 = self.divider.r1_tip_ohms;
        let r3 = self.divider.r3_ohms;
        let counts = (ADC_FULL_SCALE * r3 / (r1 + ohms + r3)).clamp(0.0, ADC_FULL_SCALE);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let counts = counts as u16;
        counts
    }
}

impl Default for SimulatedCircuit {
    fn default() -> Self {
        Self::new(BOARD_DIVIDER)
    }
}

impl AnalogFrontEnd for SimulatedCircuit {
    fn configure(&mut self, drive: DriveConfig) {
        self.drive = Some(drive);
    }

    fn convert(&mut self, channel: AnalogChannel) -> Result<u16, ConversionTimeout> {
        self.conversions += 1;

        let Some(drive) = self.drive else {
            return Ok(0);
        };
        // Parallel contacts on one sense line: the lowest resistance wins.
        let best = self
            .contacts
            .values()
            .filter(|(path, _)| path.wiring() == (drive, channel))
            .map(|(_, ohms)| *ohms)
            .reduce(f32::min);
        Ok(best.map_or(0, |ohms| self.reading(ohms)))
    }
}
