#![allow(dead_code)]

//! Telemetry ring buffer and logging helpers.
//!
//! Every sensor event drained from the scan loop lands in a fixed-capacity
//! history together with the health observations the runtime makes on the
//! side (scan overruns, probe timeouts, dropped display updates, lost hits).
//! Each record
//! is mirrored to defmt on target and to stdout on host builds.

use core::time::Duration;

use heapless::{HistoryBuf, OldestOrdered};
use scoring_core::clock::duration_micros;
use scoring_core::config::ConfigFallback;
use scoring_core::{HitKind, Instant, LightState, SensorEvent, TimedEvent, WeaponKind};

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 128;

/// Monotonic identifier assigned to each record.
pub type EventId = u32;

/// Telemetry ring buffer type alias.
pub type TelemetryRing = HistoryBuf<TelemetryRecord, TELEMETRY_RING_CAPACITY>;

/// What a telemetry record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryEventKind {
    WeaponChanged(WeaponKind),
    Hit(HitKind),
    Lights(LightState),
    Parry(bool),
    ConfigFallback(ConfigFallback),
    /// Scan periods lost since the previous overrun report.
    ScanOverrun { skipped: u64 },
    /// Conversions that missed their deadline since the previous report.
    ProbeTimeouts { count: u32 },
    /// Display updates discarded since the previous report.
    DroppedUpdates { count: u32 },
    /// Hit or weapon events lost since the previous report.
    LostCritical { count: u32 },
}

impl From<SensorEvent> for TelemetryEventKind {
    fn from(event: SensorEvent) -> Self {
        match event {
            SensorEvent::LightsChanged(state) => TelemetryEventKind::Lights(state),
            SensorEvent::WeaponChanged(kind) => TelemetryEventKind::WeaponChanged(kind),
            SensorEvent::Hit(kind) => TelemetryEventKind::Hit(kind),
            SensorEvent::ParryChanged(active) => TelemetryEventKind::Parry(active),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Instant,
    pub event: TelemetryEventKind,
    /// Time since the previous touch, set on hit records only.
    pub since_previous_hit: Option<Duration>,
}

/// Cumulative health counters sampled from the status store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthCounters {
    pub skipped_scans: u64,
    pub probe_timeouts: u32,
    pub dropped_updates: u32,
    pub lost_critical: u32,
}

impl HealthCounters {
    const ZERO: Self = Self {
        skipped_scans: 0,
        probe_timeouts: 0,
        dropped_updates: 0,
        lost_critical: 0,
    };
}

/// Records telemetry events into a fixed-size ring buffer and mirrors them to
/// defmt / stdout.
pub struct TelemetryRecorder {
    ring: TelemetryRing,
    last_hit_at: Option<Instant>,
    next_event_id: EventId,
    /// Counters as last reported, so only increments get logged.
    reported: HealthCounters,
}

impl TelemetryRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_hit_at: None,
            next_event_id: 0,
            reported: HealthCounters::ZERO,
        }
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Iterates over records from oldest to newest.
    #[must_use]
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Records one event drained from the sensor queue.
    pub fn record_event(&mut self, event: TimedEvent) -> EventId {
        let since_previous_hit = match event.event {
            SensorEvent::Hit(_) => {
                let elapsed = self
                    .last_hit_at
                    .map(|previous| event.at.saturating_duration_since(previous));
                self.last_hit_at = Some(event.at);
                elapsed
            }
            _ => None,
        };

        match event.event {
            SensorEvent::WeaponChanged(kind) => log_weapon_change(kind, event.at),
            SensorEvent::Hit(kind) => log_hit(kind, event.at, since_previous_hit),
            // Lights and parry updates are too frequent for the console.
            SensorEvent::LightsChanged(_) | SensorEvent::ParryChanged(_) => {}
        }

        self.push(event.at, event.event.into(), since_previous_hit)
    }

    /// Records a persisted setting that was replaced at boot.
    pub fn record_config_fallback(&mut self, fallback: ConfigFallback, timestamp: Instant) -> EventId {
        log_config_fallback(fallback);
        self.push(timestamp, TelemetryEventKind::ConfigFallback(fallback), None)
    }

    /// Compares cumulative health counters with the last report and records
    /// whatever grew.
    pub fn record_health(&mut self, timestamp: Instant, counters: HealthCounters) {
        let reported = self.reported;
        self.reported = counters;

        if counters.skipped_scans > reported.skipped_scans {
            let skipped = counters.skipped_scans - reported.skipped_scans;
            log_scan_overrun(skipped, timestamp);
            self.push(timestamp, TelemetryEventKind::ScanOverrun { skipped }, None);
        }
        if counters.probe_timeouts > reported.probe_timeouts {
            let count = counters.probe_timeouts - reported.probe_timeouts;
            log_probe_timeouts(count, timestamp);
            self.push(timestamp, TelemetryEventKind::ProbeTimeouts { count }, None);
        }
        if counters.dropped_updates > reported.dropped_updates {
            let count = counters.dropped_updates - reported.dropped_updates;
            log_dropped_updates(count, timestamp);
            self.push(timestamp, TelemetryEventKind::DroppedUpdates { count }, None);
        }
        if counters.lost_critical > reported.lost_critical {
            let count = counters.lost_critical - reported.lost_critical;
            log_lost_critical(count, timestamp);
            self.push(timestamp, TelemetryEventKind::LostCritical { count }, None);
        }
    }

    fn push(
        &mut self,
        timestamp: Instant,
        event: TelemetryEventKind,
        since_previous_hit: Option<Duration>,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            since_previous_hit,
        });

        id
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn log_hit(kind: HitKind, timestamp: Instant, since_previous: Option<Duration>) {
    emit_hit(
        hit_label(kind),
        timestamp.as_micros(),
        since_previous.map(duration_micros),
    );
}

#[cfg(target_os = "none")]
fn emit_hit(label: &'static str, timestamp_us: u64, delta_us: Option<u64>) {
    if let Some(delta) = delta_us {
        defmt::info!("telemetry:hit {} t={}us Δ={}us", label, timestamp_us, delta);
    } else {
        defmt::info!("telemetry:hit {} t={}us", label, timestamp_us);
    }
}

#[cfg(not(target_os = "none"))]
fn emit_hit(label: &'static str, timestamp_us: u64, delta_us: Option<u64>) {
    if let Some(delta) = delta_us {
        println!("telemetry:hit {label} t={timestamp_us}us Δ={delta}us");
    } else {
        println!("telemetry:hit {label} t={timestamp_us}us");
    }
}

#[cfg(target_os = "none")]
fn log_weapon_change(kind: WeaponKind, timestamp: Instant) {
    defmt::info!(
        "telemetry:weapon {} t={}us",
        kind.label(),
        timestamp.as_micros()
    );
}

#[cfg(not(target_os = "none"))]
fn log_weapon_change(kind: WeaponKind, timestamp: Instant) {
    println!("telemetry:weapon {kind} t={}us", timestamp.as_micros());
}

#[cfg(target_os = "none")]
fn log_config_fallback(fallback: ConfigFallback) {
    defmt::warn!("telemetry:config {}", defmt::Display2Format(&fallback));
}

#[cfg(not(target_os = "none"))]
fn log_config_fallback(fallback: ConfigFallback) {
    println!("telemetry:config {fallback}");
}

#[cfg(target_os = "none")]
fn log_scan_overrun(skipped: u64, timestamp: Instant) {
    defmt::warn!(
        "telemetry:scan skipped={} t={}us",
        skipped,
        timestamp.as_micros()
    );
}

#[cfg(not(target_os = "none"))]
fn log_scan_overrun(skipped: u64, timestamp: Instant) {
    println!("telemetry:scan skipped={skipped} t={}us", timestamp.as_micros());
}

#[cfg(target_os = "none")]
fn log_probe_timeouts(count: u32, timestamp: Instant) {
    defmt::error!(
        "telemetry:probe timeouts={} t={}us",
        count,
        timestamp.as_micros()
    );
}

#[cfg(not(target_os = "none"))]
fn log_probe_timeouts(count: u32, timestamp: Instant) {
    println!("telemetry:probe timeouts={count} t={}us", timestamp.as_micros());
}

#[cfg(target_os = "none")]
fn log_dropped_updates(count: u32, timestamp: Instant) {
    defmt::warn!(
        "telemetry:lights dropped={} t={}us",
        count,
        timestamp.as_micros()
    );
}

#[cfg(not(target_os = "none"))]
fn log_dropped_updates(count: u32, timestamp: Instant) {
    println!("telemetry:lights dropped={count} t={}us", timestamp.as_micros());
}

#[cfg(target_os = "none")]
fn log_lost_critical(count: u32, timestamp: Instant) {
    defmt::error!(
        "telemetry:events lost={} t={}us",
        count,
        timestamp.as_micros()
    );
}

#[cfg(not(target_os = "none"))]
fn log_lost_critical(count: u32, timestamp: Instant) {
    println!("telemetry:events lost={count} t={}us", timestamp.as_micros());
}

const fn hit_label(kind: HitKind) -> &'static str {
    use scoring_core::Side;

    match kind {
        HitKind::OnTarget(Side::Left) => "on-target left",
        HitKind::OnTarget(Side::Right) => "on-target right",
        HitKind::OffTarget(Side::Left) => "off-target left",
        HitKind::OffTarget(Side::Right) => "off-target right",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring_core::Side;

    fn at(micros: u64) -> Instant {
        Instant::from_micros(micros)
    }

    fn hit(micros: u64, kind: HitKind) -> TimedEvent {
        TimedEvent::new(at(micros), SensorEvent::Hit(kind))
    }

    #[test]
    fn records_elapsed_between_touches() {
        let mut recorder = TelemetryRecorder::new();

        let id1 = recorder.record_event(hit(1_540, HitKind::OnTarget(Side::Left)));
        assert_eq!(id1, 0);
        let first = recorder.latest().copied().unwrap();
        assert_eq!(first.event, TelemetryEventKind::Hit(HitKind::OnTarget(Side::Left)));
        assert_eq!(first.since_previous_hit, None);

        recorder.record_event(TimedEvent::new(
            at(1_540),
            SensorEvent::LightsChanged(LightState::OFF.with(LightState::RED, true)),
        ));
        assert_eq!(recorder.latest().unwrap().since_previous_hit, None);

        let id3 = recorder.record_event(hit(2_100, HitKind::OnTarget(Side::Right)));
        assert_eq!(id3, 2);
        let third = recorder.latest().copied().unwrap();
        assert_eq!(third.since_previous_hit, Some(Duration::from_micros(560)));
    }

    fn health(skipped_scans: u64, probe_timeouts: u32, dropped_updates: u32) -> HealthCounters {
        HealthCounters {
            skipped_scans,
            probe_timeouts,
            dropped_updates,
            lost_critical: 0,
        }
    }

    #[test]
    fn health_reports_only_increments() {
        let mut recorder = TelemetryRecorder::new();

        recorder.record_health(at(100), HealthCounters::default());
        assert!(recorder.is_empty());

        recorder.record_health(at(200), health(3, 0, 2));
        let kinds: heapless::Vec<TelemetryEventKind, 4> =
            recorder.oldest_first().map(|record| record.event).collect();
        assert_eq!(
            kinds.as_slice(),
            &[
                TelemetryEventKind::ScanOverrun { skipped: 3 },
                TelemetryEventKind::DroppedUpdates { count: 2 },
            ]
        );

        recorder.record_health(at(300), health(3, 1, 2));
        assert_eq!(recorder.len(), 3);
        assert_eq!(
            recorder.latest().unwrap().event,
            TelemetryEventKind::ProbeTimeouts { count: 1 }
        );
    }

    #[test]
    fn lost_hits_get_their_own_record() {
        let mut recorder = TelemetryRecorder::new();
        let mut counters = HealthCounters {
            lost_critical: 2,
            ..HealthCounters::default()
        };
        recorder.record_health(at(1_000), counters);
        assert_eq!(recorder.len(), 1);
        let record = recorder.latest().copied().unwrap();
        assert_eq!(record.event, TelemetryEventKind::LostCritical { count: 2 });
        assert_eq!(record.timestamp, at(1_000));

        recorder.record_health(at(2_000), counters);
        assert_eq!(recorder.len(), 1);

        counters.lost_critical = 5;
        recorder.record_health(at(3_000), counters);
        assert_eq!(
            recorder.latest().unwrap().event,
            TelemetryEventKind::LostCritical { count: 3 }
        );
    }

    #[test]
    fn config_fallbacks_are_kept() {
        let mut recorder = TelemetryRecorder::new();
        recorder.record_config_fallback(ConfigFallback::ZeroLightsDuration, Instant::ZERO);
        assert_eq!(
            recorder.latest().unwrap().event,
            TelemetryEventKind::ConfigFallback(ConfigFallback::ZeroLightsDuration)
        );
    }
}
