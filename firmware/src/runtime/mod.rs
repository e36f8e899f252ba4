use core::cell::RefCell;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::Flex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::signal::Signal;
use scoring_core::calibration::ResistorDivider;
use scoring_core::config::PersistedSettings;
use scoring_core::{DetectionMode, Instant, ScoringSensor, SensorSettings, WeaponKind};
use static_cell::StaticCell;

use crate::hw::{BoardFrontEnd, DriveLines, SenseInputs};
use crate::scan::{ScanLoop, SharedEvents};
use crate::status;
use crate::telemetry::TelemetryRecorder;

mod events_task;
mod scan_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Series and sense resistors fitted on the board.
const BOARD_DIVIDER: ResistorDivider = ResistorDivider::new(1000.0, 1000.0, 1000.0);

/// Values the box boots with until a settings store exists.
const BOARD_SETTINGS: PersistedSettings = PersistedSettings {
    start_weapon: Some(WeaponKind::Foil.code()),
    lights_ms: 2_000,
    detection_mode: Some(DetectionMode::Auto.code()),
    mirrored: false,
};

/// Both tasks run on the thread-mode executor, so the queue never needs
/// interrupts masked.
pub(super) static EVENTS: Mutex<ThreadModeRawMutex, RefCell<SharedEvents>> =
    Mutex::new(RefCell::new(SharedEvents::new()));
/// Raised by the scan task whenever the queue holds something.
pub(super) static EVENTS_READY: Signal<ThreadModeRawMutex, ()> = Signal::new();

static TELEMETRY: StaticCell<TelemetryRecorder> = StaticCell::new();

pub(super) fn now() -> Instant {
    Instant::from_micros(embassy_time::Instant::now().as_micros())
}

pub(super) fn to_embassy(instant: Instant) -> embassy_time::Instant {
    embassy_time::Instant::from_micros(instant.as_micros())
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PB3,
        PB4,
        PB5,
        PB6,
        PB7,
        PB8,
        PB9,
        ADC1,
        ..
    } = hal::init(config);

    let drive = DriveLines {
        al: Flex::new(PB3),
        bl: Flex::new(PB4),
        cl: Flex::new(PB5),
        ar: Flex::new(PB6),
        br: Flex::new(PB7),
        cr: Flex::new(PB8),
        piste: Flex::new(PB9),
    };
    let sense = SenseInputs {
        bl: PA0.degrade_adc(),
        br: PA1.degrade_adc(),
        cl: PA4.degrade_adc(),
        cr: PA5.degrade_adc(),
        piste: PA6.degrade_adc(),
    };
    let front_end = BoardFrontEnd::new(Adc::new(ADC1), drive, sense);

    let telemetry = TELEMETRY.init(TelemetryRecorder::new());
    let (settings, fallbacks) = SensorSettings::from_persisted(BOARD_SETTINGS);
    for fallback in fallbacks {
        telemetry.record_config_fallback(fallback, now());
    }

    let sensor = ScoringSensor::new(front_end, BOARD_DIVIDER.calibration(), settings);
    status::record_weapon(sensor.active_weapon());
    defmt::info!(
        "scoring: start weapon={} mode={}",
        sensor.active_weapon().label(),
        defmt::Display2Format(&sensor.detection_mode())
    );

    spawner
        .spawn(events_task::run(telemetry))
        .expect("failed to spawn event drain task");

    spawner
        .spawn(scan_task::run(ScanLoop::new(sensor)))
        .expect("failed to spawn scan task");

    core::future::pending::<()>().await;
}
