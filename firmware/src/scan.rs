#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Scan pacing and event hand-off shared by the scan and drain tasks.
//!
//! The scan task owns a [`ScanLoop`] and the drain task owns the telemetry
//! recorder; the two meet only at the bounded event queue.

use scoring_core::scheduler::ScanStats;
use scoring_core::weapons::timing::SCAN_PERIOD;
use scoring_core::{
    AnalogFrontEnd, EventQueue, EventSink, Instant, ScanOutcome, ScanScheduler, ScoringSensor,
    SensorStats,
};

use crate::status;
use crate::telemetry::TelemetryRecorder;

/// Depth of the queue between the scan task and the drain task.
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Queue type shared by the two tasks.
pub type SharedEvents = EventQueue<EVENT_QUEUE_DEPTH>;

/// Sensor plus the scheduler that paces it.
pub struct ScanLoop<F> {
    sensor: ScoringSensor<F>,
    scheduler: ScanScheduler,
}

impl<F> ScanLoop<F>
where
    F: AnalogFrontEnd,
{
    #[must_use]
    pub fn new(sensor: ScoringSensor<F>) -> Self {
        Self {
            sensor,
            scheduler: ScanScheduler::new(SCAN_PERIOD),
        }
    }

    /// Runs one scan if the period has elapsed at `now`.
    pub fn poll<S: EventSink>(&mut self, now: Instant, sink: &mut S) -> Option<ScanOutcome> {
        let mut outcome = None;
        let sensor = &mut self.sensor;
        self.scheduler.run_due(now, |at| {
            outcome = Some(sensor.scan(at, sink));
        });
        outcome
    }

    /// Pacing and sensor counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> (ScanStats, SensorStats) {
        (self.scheduler.stats(), self.sensor.stats())
    }

    /// When the next scan is due, `None` before the first poll.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// `true` while a touch is about to confirm and the loop must not sleep.
    #[must_use]
    pub fn hit_imminent(&self) -> bool {
        self.sensor.hit_imminent()
    }
}

/// Moves every queued event into the status store and the telemetry ring.
pub fn drain(events: &mut SharedEvents, telemetry: &mut TelemetryRecorder) -> usize {
    let mut drained = 0;
    while let Some(event) = events.pop() {
        status::record_event(&event);
        telemetry.record_event(event);
        drained += 1;
    }
    drained
}
