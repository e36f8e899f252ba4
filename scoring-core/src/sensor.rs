//! The scoring sensor: one explicitly owned instance running the full scan
//! pipeline (detector, lockout, lights, weapon machine) once per tick.

use core::fmt;
use core::time::Duration;

use heapless::{Deque, Vec};

use crate::calibration::Calibration;
use crate::clock::Instant;
use crate::config::SensorSettings;
use crate::detector::{DetectionMode, WeaponDetector};
use crate::events::{Delivery, EventSink, HitKind, PublishError, SensorEvent, TimedEvent};
use crate::lights::{Lamps, LightComposer, LightInputs, LightState};
use crate::lockout::LockoutController;
use crate::probe::{AnalogFrontEnd, PerSide, Probe, ProbeStats};
use crate::weapons::timing::DEFAULT_LIGHTS_DURATION;
use crate::weapons::{ActiveMachine, ScanContext, ScanPhase, TickReport, WeaponKind};

/// Events held back while the sink refuses critical ones.
const BACKLOG_CAPACITY: usize = 8;

/// Counters accumulated since construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SensorStats {
    pub scans: u64,
    pub hits: u32,
    pub weapon_changes: u32,
    /// Display updates that never reached the sink.
    pub dropped_updates: u32,
    /// Hit or weapon events lost after the backlog filled up.
    pub lost_critical: u32,
    pub probe: ProbeStats,
}

/// What one scan changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanOutcome {
    pub weapon_changed: Option<WeaponKind>,
    pub lights: Option<LightState>,
    pub hits: Vec<HitKind, 2>,
    pub parry: Option<bool>,
    /// Lockout drained and the bout state was cleared.
    pub reset: bool,
}

/// Snapshot for operator status queries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SensorStatus {
    pub weapon: WeaponKind,
    pub mode: DetectionMode,
    pub lights: LightState,
    pub phase: ScanPhase,
    pub lock_started: bool,
    pub locked: bool,
    pub signals: PerSide<bool>,
    pub prevent_buzzer: bool,
    pub lights_duration: Duration,
    pub stats: SensorStats,
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            ScanPhase::Idle => "idle",
            ScanPhase::Debouncing => "debouncing",
        };
        let lock = match (self.lock_started, self.locked) {
            (false, _) => "open",
            (true, false) => "locking",
            (true, true) => "locked",
        };
        write!(
            f,
            "weapon={} mode={} lights={} phase={phase} lock={lock} signals={}/{} \
             prevent_buzzer={} lights_ms={} scans={} hits={} dropped={} lost={} timeouts={}",
            self.weapon,
            self.mode,
            self.lights,
            u8::from(self.signals.left()),
            u8::from(self.signals.right()),
            self.prevent_buzzer,
            self.lights_duration.as_millis(),
            self.stats.scans,
            self.stats.hits,
            self.stats.dropped_updates,
            self.stats.lost_critical,
            self.stats.probe.timeouts,
        )
    }
}

pub struct ScoringSensor<F> {
    probe: Probe<F>,
    calibration: Calibration,
    settings: SensorSettings,
    weapon: WeaponKind,
    machine: ActiveMachine,
    detector: WeaponDetector,
    lockout: LockoutController,
    lamps: Lamps,
    composer: LightComposer,
    signals: PerSide<bool>,
    backlog: Deque<TimedEvent, BACKLOG_CAPACITY>,
    stats: SensorStats,
}

impl<F> ScoringSensor<F>
where
    F: AnalogFrontEnd,
{
    /// Builds a sensor in its post-reset state for the configured default weapon.
    pub fn new(front_end: F, calibration: Calibration, settings: SensorSettings) -> Self {
        let weapon = settings.default_weapon;
        Self {
            probe: Probe::new(front_end, calibration.for_weapon(weapon)),
            calibration,
            settings,
            weapon,
            machine: ActiveMachine::for_weapon(weapon),
            detector: WeaponDetector::new(settings.detection_mode),
            lockout: LockoutController::new(),
            lamps: Lamps::default(),
            composer: LightComposer::new(),
            signals: PerSide::splat(false),
            backlog: Deque::new(),
            stats: SensorStats::default(),
        }
    }

    /// Runs one full pipeline cycle at `now` and publishes what changed.
    pub fn scan<S: EventSink>(&mut self, now: Instant, sink: &mut S) -> ScanOutcome {
        self.stats.scans = self.stats.scans.wrapping_add(1);
        self.flush_backlog(sink);
        let mut outcome = ScanOutcome::default();

        // A touch on display stops counting as activity once its lights are due off.
        let displaying = self.lockout.lock_started() && !self.lockout.reset_due(now);
        let activity = displaying || self.machine.phase() == ScanPhase::Debouncing;
        let circuits = self.machine.circuit_status();
        if let Some(kind) =
            self.detector
                .evaluate(self.weapon, &circuits, &self.lamps, activity, now)
        {
            self.change_weapon(kind, now, sink);
            outcome.weapon_changed = Some(kind);
        }

        if self.lockout.is_locked(now) {
            self.block_all_new_hits();
            if self.lockout.ok_to_reset(now, self.settings.lights_duration) {
                self.clear_bout();
                outcome.reset = true;
            }
        }

        outcome.lights = self.refresh_lights(now, sink);

        let mut report = TickReport::default();
        let mut ctx = ScanContext {
            probe: &mut self.probe,
            detector: &mut self.detector,
            lamps: &mut self.lamps,
            lockout: &mut self.lockout,
            signals: &mut self.signals,
            report: &mut report,
            now,
        };
        self.machine.tick(&mut ctx);

        for hit in &report.hits {
            self.stats.hits = self.stats.hits.saturating_add(1);
            self.emit(TimedEvent::new(now, SensorEvent::Hit(*hit)), sink);
        }
        if let Some(parry) = report.parry {
            self.emit(TimedEvent::new(now, SensorEvent::ParryChanged(parry)), sink);
        }
        outcome.hits = report.hits;
        outcome.parry = report.parry;
        outcome
    }

    #[must_use]
    pub const fn active_weapon(&self) -> WeaponKind {
        self.weapon
    }

    /// Operator override. Always resets the bout; publishes only a real change.
    pub fn set_active_weapon<S: EventSink>(&mut self, kind: WeaponKind, now: Instant, sink: &mut S) {
        if kind == self.weapon {
            self.reset(now, sink);
        } else {
            self.change_weapon(kind, now, sink);
            self.refresh_lights(now, sink);
        }
    }

    pub fn set_detection_mode(&mut self, mode: DetectionMode) {
        self.settings.detection_mode = mode;
        self.detector.set_mode(mode);
    }

    #[must_use]
    pub const fn detection_mode(&self) -> DetectionMode {
        self.settings.detection_mode
    }

    /// Last published light bitmask.
    #[must_use]
    pub const fn light_state(&self) -> LightState {
        self.composer.current()
    }

    /// External reset: clears lights, lock and hit signals.
    pub fn reset<S: EventSink>(&mut self, now: Instant, sink: &mut S) {
        self.clear_bout();
        self.refresh_lights(now, sink);
    }

    /// Referee hold: no new touch registers on either side.
    pub fn block_all_new_hits(&mut self) {
        self.signals = PerSide::splat(true);
    }

    pub fn allow_all_new_hits(&mut self) {
        self.signals = PerSide::splat(false);
    }

    /// `true` while a touch is about to confirm; the caller should not yield.
    #[must_use]
    pub fn hit_imminent(&self) -> bool {
        self.machine.hit_imminent()
    }

    #[must_use]
    pub fn stats(&self) -> SensorStats {
        SensorStats {
            probe: self.probe.stats(),
            ..self.stats
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SensorSettings {
        &self.settings
    }

    /// Zero restores the default duration.
    pub fn set_lights_duration(&mut self, duration: Duration) {
        self.settings.lights_duration = if duration.is_zero() {
            DEFAULT_LIGHTS_DURATION
        } else {
            duration
        };
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.settings.mirrored = mirrored;
    }

    #[must_use]
    pub fn status(&self, now: Instant) -> SensorStatus {
        SensorStatus {
            weapon: self.weapon,
            mode: self.settings.detection_mode,
            lights: self.composer.current(),
            phase: self.machine.phase(),
            lock_started: self.lockout.lock_started(),
            locked: self.lockout.is_locked(now),
            signals: self.signals,
            prevent_buzzer: self.detector.prevent_buzzer(),
            lights_duration: self.settings.lights_duration,
            stats: self.stats(),
        }
    }

    #[must_use]
    pub fn signals(&self) -> PerSide<bool> {
        self.signals
    }

    #[must_use]
    pub const fn lockout(&self) -> &LockoutController {
        &self.lockout
    }

    #[must_use]
    pub const fn detector(&self) -> &WeaponDetector {
        &self.detector
    }

    /// Events waiting for the sink to accept them.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn front_end(&self) -> &F {
        self.probe.front_end()
    }

    pub fn front_end_mut(&mut self) -> &mut F {
        self.probe.front_end_mut()
    }

    fn change_weapon<S: EventSink>(&mut self, kind: WeaponKind, now: Instant, sink: &mut S) {
        self.weapon = kind;
        self.probe.set_thresholds(self.calibration.for_weapon(kind));
        self.machine = ActiveMachine::for_weapon(kind);
        self.detector.reset_long_timers();
        self.detector.clear_prevent_buzzer();
        self.stats.weapon_changes = self.stats.weapon_changes.saturating_add(1);
        self.emit(TimedEvent::new(now, SensorEvent::WeaponChanged(kind)), sink);
        self.clear_bout();
    }

    fn clear_bout(&mut self) {
        self.lamps.clear();
        self.lockout.reset();
        self.allow_all_new_hits();
        self.machine.reset();
    }

    fn refresh_lights<S: EventSink>(&mut self, now: Instant, sink: &mut S) -> Option<LightState> {
        let inputs = LightInputs {
            buzzer: self.lockout.buzzer(),
            prevent_buzzer: self.detector.prevent_buzzer(),
            mirrored: self.settings.mirrored,
        };
        let state = self
            .composer
            .compose(self.weapon, &self.lamps, inputs, now)?;
        self.emit(TimedEvent::new(now, SensorEvent::LightsChanged(state)), sink);
        Some(state)
    }

    /// Publishes in order: nothing overtakes an event already held back.
    fn emit<S: EventSink>(&mut self, event: TimedEvent, sink: &mut S) {
        if !self.backlog.is_empty() {
            self.hold(event);
            return;
        }

        match sink.publish(event) {
            Ok(Delivery::Queued | Delivery::EvictedOldest) => {}
            Ok(Delivery::Discarded) => {
                self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
            }
            Err(PublishError::Full(pending)) => self.hold(pending),
        }
    }

    fn hold(&mut self, event: TimedEvent) {
        if self.backlog.is_full() {
            let droppable = self
                .backlog
                .iter()
                .position(|held| held.event.is_droppable());
            let Some(position) = droppable else {
                self.count_lost(event);
                return;
            };
            self.remove_held(position);
        }

        if let Err(rejected) = self.backlog.push_back(event) {
            self.count_lost(rejected);
        }
    }

    fn remove_held(&mut self, position: usize) {
        let mut kept: Deque<TimedEvent, BACKLOG_CAPACITY> = Deque::new();
        for (index, held) in self.backlog.iter().enumerate() {
            if index != position {
                let _ = kept.push_back(*held);
            }
        }
        self.backlog = kept;
        self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
    }

    fn count_lost(&mut self, event: TimedEvent) {
        if event.event.is_droppable() {
            self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
        } else {
            self.stats.lost_critical = self.stats.lost_critical.saturating_add(1);
        }
    }

    fn flush_backlog<S: EventSink>(&mut self, sink: &mut S) {
        while let Some(held) = self.backlog.front().copied() {
            match sink.publish(held) {
                Ok(delivery) => {
                    self.backlog.pop_front();
                    if delivery == Delivery::Discarded {
                        self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
                    }
                }
                Err(PublishError::Full(_)) => break,
            }
        }
    }
}
