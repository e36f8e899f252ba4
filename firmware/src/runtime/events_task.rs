use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};

use super::{EVENTS, EVENTS_READY, now};
use crate::scan;
use crate::status;
use crate::telemetry::TelemetryRecorder;

/// How often health counters are compared against the last report.
const HEALTH_PERIOD: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn run(telemetry: &'static mut TelemetryRecorder) -> ! {
    loop {
        match select(EVENTS_READY.wait(), Timer::after(HEALTH_PERIOD)).await {
            Either::First(()) => {
                EVENTS.lock(|events| scan::drain(&mut events.borrow_mut(), telemetry));
            }
            Either::Second(()) => {
                telemetry.record_health(now(), status::snapshot().health());
            }
        }
    }
}
