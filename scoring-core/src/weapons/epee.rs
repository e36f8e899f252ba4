//! Epee: the tip closes the A-C circuit of the attacking weapon. Whole body
//! is target, so guard and piste contact simply cancel the count.

use crate::calibration::Circuit;
use crate::debounce::DebounceTimer;
use crate::detector::CrossCheck;
use crate::events::HitKind;
use crate::probe::{AnalogFrontEnd, Measurement, Path, PerSide, Side};

use super::timing::{
    EPEE_ARMING_MARGIN, EPEE_CONTACT, EPEE_DOS_SANTOS_CORRECTION, EPEE_LOCK, EPEE_WEAPON_LEAK,
    HIT_IMMINENT_WINDOW,
};
use super::{
    CircuitStatus, ScanContext, ScanPhase, SubsampleCounter, WeaponKind, WeaponStateMachine,
};

const SUBSAMPLE_SLOTS: u8 = 4;

#[derive(Clone, Debug)]
pub struct EpeeMachine {
    phase: ScanPhase,
    contact: PerSide<DebounceTimer>,
    weapon_leak: PerSide<DebounceTimer>,
    subsample: SubsampleCounter,
}

impl EpeeMachine {
    #[must_use]
    pub fn new() -> Self {
        let mut contact =
            DebounceTimer::new(EPEE_CONTACT).with_almost_ok_window(HIT_IMMINENT_WINDOW);
        contact.set_margin(EPEE_ARMING_MARGIN);
        Self {
            phase: ScanPhase::Idle,
            contact: PerSide::splat(contact),
            weapon_leak: PerSide::splat(DebounceTimer::new(EPEE_WEAPON_LEAK)),
            subsample: SubsampleCounter::new(SUBSAMPLE_SLOTS),
        }
    }

    fn sample_side<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>, side: Side) -> bool {
        let closed = !ctx.signaled(side)
            && ctx
                .probe
                .detect(Measurement::above(Path::OwnLame(side), Circuit::Tip));
        self.contact.get_mut(side).update(closed, ctx.now);
        closed
    }

    fn idle_check<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>) {
        let slot = self.subsample.advance();
        let side = if slot % 2 == 0 { Side::Left } else { Side::Right };
        if slot < 2 {
            let leak = ctx
                .probe
                .detect(Measurement::above(Path::TipCircuit(side), Circuit::NonTip));
            let confirmed = self.weapon_leak.get_mut(side).update(leak, ctx.now);
            ctx.lamps.orange.set(side, confirmed);
        } else {
            let on_lame = ctx
                .probe
                .detect(Measurement::above(Path::OpponentLame(side), Circuit::Tip));
            ctx.detector
                .observe(CrossCheck::OpponentLame(side), on_lame, ctx.now);
        }
    }

    /// Guard and piste are re-read on every tick the side is counting.
    fn validate<F: AnalogFrontEnd>(&mut self, ctx: &mut ScanContext<'_, F>, side: Side, closed: bool) {
        if !closed || ctx.signaled(side) {
            return;
        }

        if ctx.grounded(side) {
            self.contact.get_mut(side).reset();
        } else if self.contact.get(side).is_ok() {
            ctx.award(HitKind::OnTarget(side), EPEE_LOCK);
        }
    }
}

impl Default for EpeeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeaponStateMachine for EpeeMachine {
    const KIND: WeaponKind = WeaponKind::Epee;

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

                let shortened = EPEE_CONTACT.saturating_sub(EPEE_DOS_SANTOS_CORRECTION);
                for (side, closed) in [(Side::Left, left), (Side::Right, right)] {
                    if self.contact.get(side.opponent()).is_ok() {
                        let timer = self.contact.get_mut(side);
                        timer.set_required_duration(shortened);
                        timer.update(closed, ctx.now);
                    }
                }

                self.validate(ctx, Side::Left, left);
                self.validate(ctx, Side::Right, right);
            }
        }
    }

    fn phase(&self) -> ScanPhase {
        self.phase
    }

    fn circuit_status(&self) -> CircuitStatus {
        CircuitStatus {
            tip_circuit_confirmed: PerSide::new(
                self.weapon_leak.left().is_ok(),
                self.weapon_leak.right().is_ok(),
            ),
        }
    }

    fn hit_imminent(&self) -> bool {
        Side::BOTH
            .into_iter()
            .any(|side| self.contact.get(side).is_almost_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{PathThresholds, ThresholdTable};
    use crate::weapons::testing::Rig;

    #[test]
    fn touch_scores_after_margin_corrected_contact_time() {
        let mut rig = Rig::new();
        let mut machine = EpeeMachine::new();
        rig.set(Path::OwnLame(Side::Right), true);

        // 6000 µs less the 150 µs arming margin.
        rig.run(&mut machine, 0, 5_740);
        assert!(!rig.signals.right());
        rig.run(&mut machine, 5_880, 5_880);
        assert!(rig.signals.right());
        assert!(rig.lamps.green);
        assert_eq!(rig.report.hits.as_slice(), &[HitKind::OnTarget(Side::Right)]);
        assert_eq!(rig.lockout.lock().map(|lock| lock.duration), Some(EPEE_LOCK));
    }

    #[test]
    fn guard_contact_at_five_ms_cancels_the_count() {
        let mut rig = Rig::new();
        let mut machine = EpeeMachine::new();
        rig.set(Path::OwnLame(Side::Left), true);
        rig.run(&mut machine, 0, 4_900);

        rig.set(Path::OpponentGuard(Side::Left), true);
        rig.tick(&mut machine, 5_040);
        rig.set(Path::OpponentGuard(Side::Left), false);

        // Count restarts from 5180 and needs the full time again.
        rig.run(&mut machine, 5_180, 10_920);
        assert!(!rig.signals.left());
        rig.run(&mut machine, 11_060, 11_200);
        assert!(rig.signals.left());
        assert!(rig.lamps.red);
    }

    #[test]
    fn piste_contact_never_scores() {
        let mut rig = Rig::new();
        let mut machine = EpeeMachine::new();
        rig.set(Path::OwnLame(Side::Left), true);
        rig.set(Path::Piste(Side::Left), true);
        rig.run(&mut machine, 0, 20_000);

        assert!(!rig.signals.left());
        assert!(!rig.lamps.red);
        assert!(!rig.lamps.white.left());
        assert!(!rig.lockout.lock_started());
    }

    #[test]
    fn partner_timer_is_shortened_once_one_side_confirms() {
        let mut rig = Rig::new();
        let mut machine = EpeeMachine::new();
        rig.set(Path::OwnLame(Side::Left), true);
        rig.run(&mut machine, 0, 840);
        rig.set(Path::OwnLame(Side::Right), true);
        rig.run(&mut machine, 980, 5_880);

        assert!(rig.signals.left());
        assert!(!rig.signals.right());
        // Right armed at 980 and now needs 5700 µs instead of 5850 µs.
        rig.run(&mut machine, 6_020, 6_580);
        assert!(!rig.signals.right());
        rig.tick(&mut machine, 6_720);
        assert!(rig.signals.right());
        assert!(rig.lamps.red && rig.lamps.green);
    }

    #[test]
    fn weapon_leak_lights_orange() {
        let mut rig = Rig::new();
        let mut machine = EpeeMachine::new();
        rig.set(Path::TipCircuit(Side::Left), true);
        rig.run(&mut machine, 0, 6_000);

        assert!(rig.lamps.orange.left());
        assert!(machine.circuit_status().tip_circuit_confirmed.left());
        assert!(!rig.lamps.orange.right());
    }

    #[test]
    fn uncalibrated_guard_cancels_instead_of_scoring() {
        let mut rig = Rig::new();
        let thresholds = ThresholdTable::default()
            .with_path(Path::OpponentGuard(Side::Left), PathThresholds::new(0, 0));
        rig.probe.set_thresholds(thresholds);
        let mut machine = EpeeMachine::new();
        rig.set(Path::OwnLame(Side::Left), true);
        rig.set(Path::OpponentGuard(Side::Left), true);
        rig.run(&mut machine, 0, 20_000);

        assert!(!rig.signals.left());
        assert!(!rig.lamps.red);
        assert!(!rig.lockout.lock_started());
        assert!(rig.probe.stats().invalid_calibration > 0);
    }
}
