#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The scan task and the event drainer publish what they observe into
//! lightweight atomics so any other task can take a [`StatusSnapshot`]
//! without reaching into the sensor that the scan task owns.

use core::time::Duration;

use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use scoring_core::scheduler::ScanStats;
use scoring_core::{HitKind, LightState, SensorEvent, SensorStats, Side, TimedEvent, WeaponKind};

use crate::telemetry::HealthCounters;

/// Sentinel for "no weapon published yet".
const UNKNOWN_WEAPON: u8 = u8::MAX;

static WEAPON: AtomicU8 = AtomicU8::new(UNKNOWN_WEAPON);
/// Raw [`LightState`] bits of the last drained lights event.
static LIGHTS: AtomicU8 = AtomicU8::new(0);
static HITS_LEFT: AtomicU32 = AtomicU32::new(0);
static HITS_RIGHT: AtomicU32 = AtomicU32::new(0);
static SCANS: AtomicU64 = AtomicU64::new(0);
static SKIPPED_SCANS: AtomicU64 = AtomicU64::new(0);
/// Worst scan start lateness, in microseconds.
static MAX_LATENESS_US: AtomicU32 = AtomicU32::new(0);
static PARRY: AtomicBool = AtomicBool::new(false);
static PROBE_TIMEOUTS: AtomicU32 = AtomicU32::new(0);
static DROPPED_UPDATES: AtomicU32 = AtomicU32::new(0);
static LOST_CRITICAL: AtomicU32 = AtomicU32::new(0);

/// Point-in-time view of the scoring machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub weapon: Option<WeaponKind>,
    pub lights: LightState,
    pub parry: bool,
    pub hits_left: u32,
    pub hits_right: u32,
    pub scans: u64,
    pub skipped_scans: u64,
    pub max_lateness: Duration,
    pub probe_timeouts: u32,
    pub dropped_updates: u32,
    /// Hits and weapon changes the sensor could not deliver.
    pub lost_critical: u32,
}

impl StatusSnapshot {
    /// Counters the telemetry recorder watches for growth.
    #[must_use]
    pub const fn health(&self) -> HealthCounters {
        HealthCounters {
            skipped_scans: self.skipped_scans,
            probe_timeouts: self.probe_timeouts,
            dropped_updates: self.dropped_updates,
            lost_critical: self.lost_critical,
        }
    }
}

/// Folds one drained sensor event into the shared state.
pub fn record_event(event: &TimedEvent) {
    match event.event {
        SensorEvent::WeaponChanged(kind) => WEAPON.store(kind.code(), Ordering::Relaxed),
        SensorEvent::LightsChanged(state) => LIGHTS.store(state.bits(), Ordering::Relaxed),
        SensorEvent::ParryChanged(active) => PARRY.store(active, Ordering::Relaxed),
        SensorEvent::Hit(kind) => record_hit(kind),
    }
}

/// Records the weapon the sensor booted with.
pub fn record_weapon(kind: WeaponKind) {
    WEAPON.store(kind.code(), Ordering::Relaxed);
}

fn record_hit(kind: HitKind) {
    let counter = match kind.side() {
        Side::Left => &HITS_LEFT,
        Side::Right => &HITS_RIGHT,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Publishes the cumulative pacing and sensor health counters.
pub fn record_scan_stats(pacing: ScanStats, sensor: SensorStats) {
    SCANS.store(pacing.ticks, Ordering::Relaxed);
    SKIPPED_SCANS.store(pacing.skipped, Ordering::Relaxed);
    let micros = u32::try_from(pacing.max_lateness.as_micros()).unwrap_or(u32::MAX);
    MAX_LATENESS_US.fetch_max(micros, Ordering::Relaxed);
    PROBE_TIMEOUTS.store(sensor.probe.timeouts, Ordering::Relaxed);
    DROPPED_UPDATES.store(sensor.dropped_updates, Ordering::Relaxed);
    LOST_CRITICAL.store(sensor.lost_critical, Ordering::Relaxed);
}

/// Clears every counter and the cached weapon.
#[cfg(test)]
fn reset() {
    WEAPON.store(UNKNOWN_WEAPON, Ordering::Relaxed);
    LIGHTS.store(0, Ordering::Relaxed);
    PARRY.store(false, Ordering::Relaxed);
    HITS_LEFT.store(0, Ordering::Relaxed);
    HITS_RIGHT.store(0, Ordering::Relaxed);
    SCANS.store(0, Ordering::Relaxed);
    SKIPPED_SCANS.store(0, Ordering::Relaxed);
    MAX_LATENESS_US.store(0, Ordering::Relaxed);
    PROBE_TIMEOUTS.store(0, Ordering::Relaxed);
    DROPPED_UPDATES.store(0, Ordering::Relaxed);
    LOST_CRITICAL.store(0, Ordering::Relaxed);
}

/// Builds a [`StatusSnapshot`] using the stored metrics.
#[must_use]
pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        weapon: WeaponKind::from_code(WEAPON.load(Ordering::Relaxed)),
        lights: LightState::from_bits(LIGHTS.load(Ordering::Relaxed)),
        parry: PARRY.load(Ordering::Relaxed),
        hits_left: HITS_LEFT.load(Ordering::Relaxed),
        hits_right: HITS_RIGHT.load(Ordering::Relaxed),
        scans: SCANS.load(Ordering::Relaxed),
        skipped_scans: SKIPPED_SCANS.load(Ordering::Relaxed),
        max_lateness: Duration::from_micros(u64::from(MAX_LATENESS_US.load(Ordering::Relaxed))),
        probe_timeouts: PROBE_TIMEOUTS.load(Ordering::Relaxed),
        dropped_updates: DROPPED_UPDATES.load(Ordering::Relaxed),
        lost_critical: LOST_CRITICAL.load(Ordering::Relaxed),
    }
}
