//! Foil: tip opens the A-B circuit; the touch scores on the opponent's lamé
//! and shows white anywhere else except guard and piste.

use crate::calibration::Circuit;
use crate::debounce::{DebounceTimer, DoubleDebouncer};
use crate::detector::CrossCheck;
use crate::events::HitKind;
use crate::probe::{AnalogFrontEnd, Measurement, Path, PerSide, Side};

use super::timing::{
    FOIL_CONTACT, FOIL_DOS_SANTOS_CORRECTION, FOIL_LAME_LEAK, FOIL_LOCK, FOIL_PARRY_OFF,
    FOIL_PARRY_ON, HIT_IMMINENT_WINDOW,
};
use super::{
    CircuitStatus, ScanContext, ScanPhase, SubsampleCounter, WeaponKind, WeaponStateMachine,
};

const SUBSAMPLE_SLOTS: u8 = 3;

#[derive(Clone, Debug)]
pub struct FoilMachine {
    phase: ScanPhase,
    contact: PerSide<DebounceTimer>,
    /// Tip-open confirmation for weapon detection. Keeps counting while a
    /// side is signaled, unlike `contact`.
    tip_open: PerSide<DebounceTimer>,
    /// Lamé reading captured when the side's contact timer armed.
    on_target: PerSide<bool>,
    lame_leak: PerSide<DebounceTimer>,
    parry: DoubleDebouncer,
    subsample: SubsampleCounter,
}

impl FoilMachine {
    #[must_use]
    pub fn new() -> Self {
        let contact = DebounceTimer::new(FOIL_CONTACT).with_almost_ok_window(HIT_IMMINENT_WINDOW);
        Self {
            phase: ScanPhase::Idle,
            contact: PerSide::splat(contact),
            tip_open: PerSide::splat(DebounceTimer::new(FOIL_CONTACT)),
            on_target: PerSide::splat(false),
            lame_leak: PerSide::splat(DebounceTimer::new(FOIL_LAME_LEAK)),
            parry: DoubleDebouncer::new(FOIL_PARRY_ON, FOIL_PARRY_OFF),
            subsample: SubsampleCounter::new(SUBSAMPLE_SLOTS),
        }
    }

    /// Current blade-on-blade state.
    #[must_use]
    pub const fn parry(&self) -> bool {
        self.parry.is_ok()
    }

    /// Reads tip and lamé for one side and feeds the contact timer.
    ///
    /// A signaled side is not re-read; its tip-open timer is fed the last
    /// reading instead.
    fn sample_side<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>, side: Side) -> bool {
        if ctx.signaled(side) {
            self.contact.get_mut(side).update(false, ctx.now);
            let tip_open = self.tip_open.get_mut(side);
            let held = tip_open.is_running();
            tip_open.update(held, ctx.now);
            return false;
        }

        let open = ctx
            .probe
            .detect(Measurement::below(Path::TipCircuit(side), Circuit::Tip));
        ctx.detector.set_not_connected(side, open);
        self.tip_open.get_mut(side).update(open, ctx.now);
        let on_lame = ctx
            .probe
            .detect(Measurement::above(Path::OpponentLame(side), Circuit::Tip));
        ctx.detector
            .observe(CrossCheck::OpponentLame(side), on_lame, ctx.now);

        let timer = self.contact.get_mut(side);
        let was_running = timer.is_running();
        timer.update(open, ctx.now);
        if open && !was_running {
            self.on_target.set(side, on_lame);
        }
        open
    }

    fn idle_check<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>) {
        match self.subsample.advance() {
            slot @ (0 | 1) => {
                let side = if slot == 0 { Side::Left } else { Side::Right };
                let leak = ctx
                    .probe
                    .detect(Measurement::above(Path::LameLeak(side), Circuit::NonTip));
                ctx.detector.observe(CrossCheck::OwnLame(side), leak, ctx.now);
                let confirmed = self.lame_leak.get_mut(side).update(leak, ctx.now);
                ctx.lamps.orange.set(side, confirmed);
            }
            _ => {
                let before = self.parry.is_ok();
                let blades = ctx
                    .probe
                    .detect(Measurement::above(Path::BladeContact, Circuit::Tip));
                let after = self.parry.update(blades, ctx.now);
                if after != before {
                    ctx.report.parry = Some(after);
                }
            }
        }
    }

    fn confirm<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>, side: Side) {
        if ctx.signaled(side) || !self.contact.get(side).is_ok() {
            return;
        }

        if *self.on_target.get(side) {
            ctx.award(HitKind::OnTarget(side), FOIL_LOCK);
            return;
        }

        if ctx.grounded(side) {
            self.contact.get_mut(side).reset();
        } else {
            ctx.award(HitKind::OffTarget(side), FOIL_LOCK);
        }
    }
}

impl Default for FoilMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeaponStateMachine for FoilMachine {
    const KIND: WeaponKind = WeaponKind::Foil;

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn tick<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>) {
        let left = self.sample_side(ctx, Side::Left);
        let right = self.sample_side(ctx, Side::Right);

        match self.phase {
            ScanPhase::Idle => {
                if left || right {
                    self.phase = ScanPhase::Debouncing;
                } else {
                    self.idle_check(ctx);
                }
            }
            ScanPhase::Debouncing => {
                if !left && !right {
                    self.phase = ScanPhase::Idle;
                    return;
                }

                let shortened = FOIL_CONTACT.saturating_sub(FOIL_DOS_SANTOS_CORRECTION);
                for (side, open) in [(Side::Left, left), (Side::Right, right)] {
                    if self.contact.get(side.opponent()).is_ok() {
                        let timer = self.contact.get_mut(side);
                        timer.set_required_duration(shortened);
                        timer.update(open, ctx.now);
                    }
                }

                for side in Side::BOTH {
                    self.confirm(ctx, side);
                }
            }
        }
    }

    fn phase(&self) -> ScanPhase {
        self.phase
    }

    fn circuit_status(&self) -> CircuitStatus {
        CircuitStatus {
            tip_circuit_confirmed: PerSide::new(
                self.tip_open.left().is_ok(),
                self.tip_open.right().is_ok(),
            ),
        }
    }

    fn hit_imminent(&self) -> bool {
        Side::BOTH
            .into_iter()
            .any(|side| self.contact.get(side).is_almost_ok())
    }
}
