//! Sabre: any blade contact with the opponent's lamé scores; the body wire
//! continuity drives the white indicators instead of gating touches.

use crate::calibration::Circuit;
use crate::debounce::DebounceTimer;
use crate::detector::CrossCheck;
use crate::events::HitKind;
use crate::probe::{AnalogFrontEnd, Measurement, Path, PerSide, Side};

use super::timing::{
    HIT_IMMINENT_WINDOW, SABRE_CONTACT, SABRE_CONTINUITY, SABRE_DOS_SANTOS_CORRECTION, SABRE_LOCK,
};
use super::{
    CircuitStatus, ScanContext, ScanPhase, SubsampleCounter, WeaponKind, WeaponStateMachine,
};

const SUBSAMPLE_SLOTS: u8 = 4;

#[derive(Clone, Debug)]
pub struct SabreMachine {
    phase: ScanPhase,
    contact: PerSide<DebounceTimer>,
    continuity: PerSide<DebounceTimer>,
    subsample: SubsampleCounter,
}

impl SabreMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            contact: PerSide::splat(
                DebounceTimer::new(SABRE_CONTACT).with_almost_ok_window(HIT_IMMINENT_WINDOW),
            ),
            continuity: PerSide::splat(DebounceTimer::new(SABRE_CONTINUITY)),
            subsample: SubsampleCounter::new(SUBSAMPLE_SLOTS),
        }
    }

    /// Contact is read on both sides every tick, signaled or not.
    fn sample_side<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>, side: Side) -> bool {
        let on_lame = ctx
            .probe
            .detect(Measurement::above(Path::OpponentLame(side), Circuit::Tip));
        self.contact.get_mut(side).update(on_lame, ctx.now);
        ctx.detector
            .observe(CrossCheck::OpponentLame(side), on_lame, ctx.now);
        on_lame
    }

    fn idle_check<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>) {
        let slot = self.subsample.advance();
        let side = if slot % 2 == 0 { Side::Left } else { Side::Right };
        if slot < 2 {
            let broken = ctx
                .probe
                .detect(Measurement::below(Path::TipCircuit(side), Circuit::Tip));
            ctx.detector.set_not_connected(side, broken);
            let confirmed = self.continuity.get_mut(side).update(broken, ctx.now);
            ctx.lamps.white.set(side, confirmed);
        } else {
            let own_lame = ctx
                .probe
                .detect(Measurement::above(Path::OwnLame(side), Circuit::NonTip));
            ctx.detector.observe(CrossCheck::OwnLame(side), own_lame, ctx.now);
        }
    }
}

impl Default for SabreMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeaponStateMachine for SabreMachine {
    const KIND: WeaponKind = WeaponKind::Sabre;

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
                // Nothing left to count; lamé contact that persists through
                // the lock must not starve the wire checks.
                if ctx.signaled(Side::Left) && ctx.signaled(Side::Right) {
                    self.idle_check(ctx);
                    return;
                }

                let shortened = SABRE_CONTACT.saturating_sub(SABRE_DOS_SANTOS_CORRECTION);
                for (side, on_lame) in [(Side::Left, left), (Side::Right, right)] {
                    if self.contact.get(side.opponent()).is_ok() {
                        let timer = self.contact.get_mut(side);
                        timer.set_required_duration(shortened);
                        timer.update(on_lame, ctx.now);
                    }
                }

                for side in Side::BOTH {
                    if self.contact.get(side).is_ok() && !ctx.signaled(side) {
                        ctx.award(HitKind::OnTarget(side), SABRE_LOCK);
                    }
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
                self.continuity.left().is_ok(),
                self.continuity.right().is_ok(),
            ),
        }
    }

    fn hit_imminent(&self) -> bool {
        Side::BOTH
            .into_iter()
            .any(|side| self.contact.get(side).is_almost_ok())
    }
}
