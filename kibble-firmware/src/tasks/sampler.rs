//! Free-running feed switch sampler
//!
//! Converts the switch input continuously and publishes the latest
//! reading for the control task.

use defmt::*;
use embassy_time::{Duration, Ticker};

use kibble_drivers::sensor::Sampler;
use kibble_hal_rp2040::SwitchAdc;

/// Conversion interval
const SAMPLE_INTERVAL_MS: u64 = 50;

#[embassy_executor::task]
pub async fn sampler_task(mut sampler: Sampler<'static, SwitchAdc<'static>>) {
    info!("Sampler task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));

    loop {
        ticker.next().await;

        if let Err(e) = sampler.sample() {
            warn!("ADC read error: {:?}", e);
        }
    }
}
