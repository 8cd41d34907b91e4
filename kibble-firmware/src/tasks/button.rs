//! Feed button task
//!
//! Stands in for the external interrupt: waits for a press and hands it
//! to the control task. It never touches the bus.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Timer};

use kibble_core::events::Event;

use crate::channels::{EVENTS, FEED_REQUEST};

/// Contact bounce settle time
const DEBOUNCE_MS: u64 = 20;

#[embassy_executor::task]
pub async fn button_task(mut button: Input<'static>) {
    info!("Button task started");

    loop {
        button.wait_for_rising_edge().await;

        if FEED_REQUEST.raise() {
            debug!("Feed button pressed");
            if EVENTS.try_send(Event::FeedButton).is_err() {
                warn!("Event channel full, dropping button press");
                FEED_REQUEST.take();
            }
        } else {
            trace!("Feed already pending, press ignored");
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
    }
}
