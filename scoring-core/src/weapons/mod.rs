//! Per-discipline scan state machines.
//!
//! Each discipline is an explicit instance owning its debounce timers. The
//! sensor keeps exactly one of them in an [`ActiveMachine`] and swaps in a
//! fresh instance whenever the weapon changes.

pub mod epee;
pub mod foil;
pub mod sabre;
pub mod timing;

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::calibration::Circuit;
use crate::clock::Instant;
use crate::detector::WeaponDetector;
use crate::events::HitKind;
use crate::lights::Lamps;
use crate::lockout::LockoutController;
use crate::probe::{AnalogFrontEnd, Measurement, Path, PerSide, Probe, SenseError, Side};

pub use epee::EpeeMachine;
pub use foil::FoilMachine;
pub use sabre::SabreMachine;

/// Fencing discipline selecting the active state machine and timing set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WeaponKind {
    Foil,
    Epee,
    Sabre,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Foil, WeaponKind::Epee, WeaponKind::Sabre];

    const FOIL_CODE: u8 = 0;
    const EPEE_CODE: u8 = 1;
    const SABRE_CODE: u8 = 2;

    /// Stable code used by events and persisted settings.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            WeaponKind::Foil => Self::FOIL_CODE,
            WeaponKind::Epee => Self::EPEE_CODE,
            WeaponKind::Sabre => Self::SABRE_CODE,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            Self::FOIL_CODE => Some(WeaponKind::Foil),
            Self::EPEE_CODE => Some(WeaponKind::Epee),
            Self::SABRE_CODE => Some(WeaponKind::Sabre),
            _ => None,
        }
    }

    /// Lockout window mandated for the discipline.
    #[must_use]
    pub const fn lock_duration(self) -> Duration {
        match self {
            WeaponKind::Foil => timing::FOIL_LOCK,
            WeaponKind::Epee => timing::EPEE_LOCK,
            WeaponKind::Sabre => timing::SABRE_LOCK,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WeaponKind::Foil => "foil",
            WeaponKind::Epee => "epee",
            WeaponKind::Sabre => "sabre",
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse machine state shared by all disciplines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ScanPhase {
    #[default]
    Idle,
    Debouncing,
}

/// Round-robin slot selector for auxiliary checks run on idle ticks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubsampleCounter {
    next: u8,
    slots: u8,
}

impl SubsampleCounter {
    #[must_use]
    pub const fn new(slots: u8) -> Self {
        Self { next: 0, slots }
    }

    /// Returns the slot to run now and moves on to the next one.
    pub fn advance(&mut self) -> u8 {
        let current = self.next;
        self.next = if current + 1 >= self.slots { 0 } else { current + 1 };
        current
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Timer states the weapon detector cross-checks against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CircuitStatus {
    /// A-to-B timer of each side has confirmed (foil tip open, sabre wire broken,
    /// epee weapon leak).
    pub tip_circuit_confirmed: PerSide<bool>,
}

/// Side effects of one machine tick beyond lamps and lockout.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    pub hits: Vec<HitKind, 2>,
    pub parry: Option<bool>,
}

/// Everything a machine may touch during one tick.
pub struct ScanContext<'a, F> {
    pub probe: &'a mut Probe<F>,
    pub detector: &'a mut WeaponDetector,
    pub lamps: &'a mut Lamps,
    pub lockout: &'a mut LockoutController,
    /// Per-side hit latch: a set side registers nothing until reset.
    pub signals: &'a mut PerSide<bool>,
    pub report: &'a mut TickReport,
    pub now: Instant,
}

impl<F> ScanContext<'_, F>
where
    F: AnalogFrontEnd,
{
    /// Latches a confirmed touch: hit signal, lamp, buzzer and lockout.
    pub fn award(&mut self, hit: HitKind, lock: Duration) {
        let side = hit.side();
        self.signals.set(side, true);
        match hit {
            HitKind::OnTarget(_) => self.lamps.score(side),
            HitKind::OffTarget(_) => self.lamps.white.set(side, true),
        }
        self.lockout.request_buzzer();
        self.lockout.start_lock(self.now, lock);
        // At most one touch per side per tick, so two slots always suffice.
        let _ = self.report.hits.push(hit);
    }

    #[must_use]
    pub fn signaled(&self, side: Side) -> bool {
        *self.signals.get(side)
    }

    /// `true` when the side's tip rests on the opponent's guard or the piste.
    ///
    /// A path without a usable threshold counts as grounded so a broken
    /// calibration cancels touches instead of scoring them.
    pub fn grounded(&mut self, side: Side) -> bool {
        [Path::OpponentGuard(side), Path::Piste(side)]
            .into_iter()
            .any(|path| match self.probe.sense(Measurement::above(path, Circuit::Tip)) {
                Ok(contact) => contact,
                Err(SenseError::InvalidCalibration(_)) => true,
                Err(SenseError::Timeout(_)) => false,
            })
    }
}

/// One discipline's per-tick sensing and refereeing logic.
pub trait WeaponStateMachine {
    const KIND: WeaponKind;

    /// Returns every timer and the phase to the post-reset state.
    fn reset(&mut self);

    /// Runs one scan tick.
    fn tick<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>);

    fn phase(&self) -> ScanPhase;

    fn circuit_status(&self) -> CircuitStatus;

    /// `true` while a primary contact timer is about to confirm.
    fn hit_imminent(&self) -> bool;
}

/// The machine for the active weapon.
#[derive(Clone, Debug)]
pub enum ActiveMachine {
    Foil(FoilMachine),
    Epee(EpeeMachine),
    Sabre(SabreMachine),
}

impl ActiveMachine {
    /// Fresh machine in its post-reset state.
    #[must_use]
    pub fn for_weapon(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Foil => ActiveMachine::Foil(FoilMachine::new()),
            WeaponKind::Epee => ActiveMachine::Epee(EpeeMachine::new()),
            WeaponKind::Sabre => ActiveMachine::Sabre(SabreMachine::new()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> WeaponKind {
        match self {
            ActiveMachine::Foil(_) => FoilMachine::KIND,
            ActiveMachine::Epee(_) => EpeeMachine::KIND,
            ActiveMachine::Sabre(_) => SabreMachine::KIND,
        }
    }

    pub fn reset(&mut self) {
        match self {
            ActiveMachine::Foil(machine) => machine.reset(),
            ActiveMachine::Epee(machine) => machine.reset(),
            ActiveMachine::Sabre(machine) => machine.reset(),
        }
    }

    pub fn tick<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>) {
        match self {
            ActiveMachine::Foil(machine) => machine.tick(ctx),
            ActiveMachine::Epee(machine) => machine.tick(ctx),
            ActiveMachine::Sabre(machine) => machine.tick(ctx),
        }
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        match self {
            ActiveMachine::Foil(machine) => machine.phase(),
            ActiveMachine::Epee(machine) => machine.phase(),
            ActiveMachine::Sabre(machine) => machine.phase(),
        }
    }

    #[must_use]
    pub fn circuit_status(&self) -> CircuitStatus {
        match self {
            ActiveMachine::Foil(machine) => machine.circuit_status(),
            ActiveMachine::Epee(machine) => machine.circuit_status(),
            ActiveMachine::Sabre(machine) => machine.circuit_status(),
        }
    }

    #[must_use]
    pub fn hit_imminent(&self) -> bool {
        match self {
            ActiveMachine::Foil(machine) => machine.hit_imminent(),
            ActiveMachine::Epee(machine) => machine.hit_imminent(),
            ActiveMachine::Sabre(machine) => machine.hit_imminent(),
        }
    }
}

/// Shared scaffolding for the machine unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::calibration::ThresholdTable;
    use crate::probe::{AnalogChannel, ConversionTimeout, DriveConfig};

    /// A closed path reads near full scale on its sense channel, anything else reads 0.
    pub(crate) struct Bench {
        closed: heapless::Vec<Path, 13>,
        drive: DriveConfig,
    }

    impl Bench {
        pub(crate) fn new() -> Self {
            Self {
                closed: heapless::Vec::new(),
                drive: DriveConfig::RELEASED,
            }
        }

        pub(crate) fn set(&mut self, path: Path, closed: bool) {
            self.closed.retain(|candidate| *candidate != path);
            if closed {
                self.closed.push(path).unwrap();
            }
        }
    }

    impl AnalogFrontEnd for Bench {
        fn configure(&mut self, drive: DriveConfig) {
            self.drive = drive;
        }

        fn convert(&mut self, channel: AnalogChannel) -> Result<u16, ConversionTimeout> {
            let closed = self
                .closed
                .iter()
                .any(|path| path.wiring() == (self.drive, channel));
            Ok(if closed { 4_000 } else { 0 })
        }
    }

    /// Owned state behind a [`ScanContext`].
    pub(crate) struct Rig {
        pub(crate) probe: Probe<Bench>,
        pub(crate) detector: WeaponDetector,
        pub(crate) lamps: Lamps,
        pub(crate) lockout: LockoutController,
        pub(crate) signals: PerSide<bool>,
        pub(crate) report: TickReport,
    }

    impl Rig {
        pub(crate) fn new() -> Self {
            Self {
                probe: Probe::new(Bench::new(), ThresholdTable::default()),
                detector: WeaponDetector::new(crate::detector::DetectionMode::Auto),
                lamps: Lamps::default(),
                lockout: LockoutController::new(),
                signals: PerSide::splat(false),
                report: TickReport::default(),
            }
        }

        pub(crate) fn set(&mut self, path: Path, closed: bool) {
            self.probe.front_end_mut().set(path, closed);
        }

        pub(crate) fn tick<M: WeaponStateMachine>(&mut self, machine: &mut M, micros: u64) {
            self.report = TickReport::default();
            let mut ctx = ScanContext {
                probe: &mut self.probe,
                detector: &mut self.detector,
                lamps: &mut self.lamps,
                lockout: &mut self.lockout,
                signals: &mut self.signals,
                report: &mut self.report,
                now: Instant::from_micros(micros),
            };
            machine.tick(&mut ctx);
        }

        /// Ticks every scan period from `from` up to and including `to`.
        pub(crate) fn run<M: WeaponStateMachine>(&mut self, machine: &mut M, from: u64, to: u64) {
            let mut now = from;
            while now <= to {
                self.tick(machine, now);
                now += 140;
            }
        }
    }
}
