//! Schedule tick task
//!
//! Wakes the control task periodically so it can check the feed
//! schedule against the clock.

use defmt::*;
use embassy_time::{Duration, Ticker};

use kibble_core::events::Event;

use crate::channels::EVENTS;

#[embassy_executor::task]
pub async fn schedule_task(interval_secs: u32) {
    info!("Schedule task started, every {} s", interval_secs);

    let mut ticker = Ticker::every(Duration::from_secs(interval_secs as u64));

    loop {
        ticker.next().await;

        if EVENTS.try_send(Event::ScheduleTick).is_err() {
            // The control task is busy; the next tick catches up
            trace!("Event channel full, skipping schedule tick");
        }
    }
}
