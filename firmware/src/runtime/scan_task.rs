use embassy_time::Timer;

use super::{EVENTS, EVENTS_READY, now, to_embassy};
use crate::hw::BoardFrontEnd;
use crate::scan::ScanLoop;
use crate::status;

#[embassy_executor::task]
pub async fn run(mut scan: ScanLoop<BoardFrontEnd<'static>>) -> ! {
    loop {
        let queued = EVENTS.lock(|events| {
            let mut events = events.borrow_mut();
            scan.poll(now(), &mut *events).is_some() && !events.is_empty()
        });
        if queued {
            EVENTS_READY.signal(());
        }

        let (pacing, sensor) = scan.stats();
        status::record_scan_stats(pacing, sensor);

        // Spin instead of sleeping while a touch is about to confirm.
        if scan.hit_imminent() {
            continue;
        }
        match scan.next_deadline() {
            Some(due) => Timer::at(to_embassy(due)).await,
            None => embassy_futures::yield_now().await,
        }
    }
}
