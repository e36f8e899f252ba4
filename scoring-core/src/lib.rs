#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Sensing and refereeing core of a three-weapon fencing scoring machine.
//
// The crate avoids the Rust standard library so the same scan pipeline runs in
// the MCU firmware and in the host emulator. Hardware enters only through the
// `AnalogFrontEnd` seam and timestamps through `clock::Instant`.

pub mod calibration;
pub mod clock;
pub mod config;
pub mod console;
pub mod debounce;
pub mod detector;
pub mod events;
pub mod lights;
pub mod lockout;
pub mod probe;
pub mod scheduler;
pub mod sensor;
pub mod weapons;

pub use calibration::{Calibration, ResistorDivider, ThresholdTable};
pub use clock::{Instant, MonotonicClock};
pub use config::{PersistedSettings, SensorSettings};
pub use detector::DetectionMode;
pub use events::{EventQueue, EventSink, HitKind, SensorEvent, TimedEvent};
pub use lights::LightState;
pub use probe::{AnalogChannel, AnalogFrontEnd, ConversionTimeout, DriveConfig, Path, Side};
pub use scheduler::ScanScheduler;
pub use sensor::{ScanOutcome, ScoringSensor, SensorStats, SensorStatus};
pub use weapons::WeaponKind;
