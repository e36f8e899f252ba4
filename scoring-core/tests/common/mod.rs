//! Scripted strip wiring and a bout runner shared by the scenario tests.

use core::time::Duration;

use scoring_core::console::{self, ConsoleError, Reply};
use scoring_core::events::HitKind;
use scoring_core::{
    AnalogChannel, AnalogFrontEnd, Calibration, ConversionTimeout, DetectionMode, DriveConfig,
    EventQueue, Instant, Path, ScoringSensor, SensorEvent, SensorSettings, Side, TimedEvent,
    WeaponKind,
};

pub const SCAN_US: u64 = 140;

/// Every path reads open unless closed here. A closed path reads near full
/// scale only while its own drive pattern is applied.
#[derive(Default)]
pub struct Strip {
    closed: Vec<Path>,
    drive: Option<DriveConfig>,
}

impl Strip {
    pub fn close(&mut self, path: Path) {
        if !self.closed.contains(&path) {
            self.closed.push(path);
        }
    }

    pub fn open(&mut self, path: Path) {
        self.closed.retain(|candidate| *candidate != path);
    }
}

impl AnalogFrontEnd for Strip {
    fn configure(&mut self, drive: DriveConfig) {
        self.drive = Some(drive);
    }

    fn convert(&mut self, channel: AnalogChannel) -> Result<u16, ConversionTimeout> {
        let closed = self
            .closed
            .iter()
            .any(|path| Some(path.wiring()) == self.drive.map(|drive| (drive, channel)));
        Ok(if closed { 4_000 } else { 0 })
    }
}

pub struct Bout {
    pub sensor: ScoringSensor<Strip>,
    pub queue: EventQueue<64>,
    pub published: Vec<TimedEvent>,
    next_scan: u64,
    step: u64,
}

impl Bout {
    pub fn new(weapon: WeaponKind, mode: DetectionMode) -> Self {
        let settings = SensorSettings {
            default_weapon: weapon,
            detection_mode: mode,
            ..SensorSettings::default()
        };
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: SensorSettings) -> Self {
        Self {
            sensor: ScoringSensor::new(Strip::default(), Calibration::default(), settings),
            queue: EventQueue::new(),
            published: Vec::new(),
            next_scan: 0,
            step: SCAN_US,
        }
    }

    /// Scans less often; timers work from timestamps so only resolution changes.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = u64::try_from(step.as_micros()).unwrap();
        self
    }

    /// Both body wires plugged in with the A-B circuit at rest.
    pub fn plug_in(mut self) -> Self {
        for side in Side::BOTH {
            self.close(Path::TipCircuit(side));
        }
        self
    }

    pub fn close(&mut self, path: Path) {
        self.sensor.front_end_mut().close(path);
    }

    pub fn open(&mut self, path: Path) {
        self.sensor.front_end_mut().open(path);
    }

    /// Timestamp of the most recent scan.
    pub fn now(&self) -> Instant {
        Instant::from_micros(self.next_scan.saturating_sub(self.step))
    }

    /// Scans every period up to and including `micros`.
    pub fn run_until(&mut self, micros: u64) {
        while self.next_scan <= micros {
            self.sensor
                .scan(Instant::from_micros(self.next_scan), &mut self.queue);
            self.drain();
            self.next_scan += self.step;
        }
    }

    pub fn command(&mut self, line: &str) -> Result<Reply, ConsoleError> {
        let now = self.now();
        let reply = console::run_line(&mut self.sensor, line, now, &mut self.queue);
        self.drain();
        reply
    }

    pub fn hits(&self) -> Vec<(u64, HitKind)> {
        self.published
            .iter()
            .filter_map(|timed| match timed.event {
                SensorEvent::Hit(hit) => Some((timed.at.as_micros(), hit)),
                _ => None,
            })
            .collect()
    }

    pub fn weapon_changes(&self) -> Vec<(u64, WeaponKind)> {
        self.published
            .iter()
            .filter_map(|timed| match timed.event {
                SensorEvent::WeaponChanged(kind) => Some((timed.at.as_micros(), kind)),
                _ => None,
            })
            .collect()
    }

    fn drain(&mut self) {
        while let Some(event) = self.queue.pop() {
            self.published.push(event);
        }
    }
}
