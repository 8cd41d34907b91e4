//! Control task
//!
//! Owns the clock (and through it the two-wire bus), the report link, the
//! feed switch and the auger. Every feed runs to completion before the
//! next event is taken.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::Delay;

use kibble_core::config::Portions;
use kibble_core::events::Event;
use kibble_core::feed::{feed_time_today, FeedSchedule};
use kibble_core::report::StatusReporter;
use kibble_core::traits::Dispenser;
use kibble_core::twi::TransactionEngine;
use kibble_drivers::rtc::Ds1307;
use kibble_drivers::sensor::FeedSwitch;
use kibble_drivers::stepper::StepDirStepper;
use kibble_drivers::twi::BitBangTwi;
use kibble_hal_rp2040::{BlockingTx, FlexOpenDrain, SwitchAdc};

use crate::channels::{EVENTS, FEED_REQUEST};

/// Two-wire bus on two GPIO lines
pub type Bus = BitBangTwi<FlexOpenDrain<'static>, FlexOpenDrain<'static>, Delay>;
pub type Rtc = Ds1307<TransactionEngine<Bus>>;
pub type Reporter = StatusReporter<BlockingTx<'static>>;
pub type Switch = FeedSwitch<'static, SwitchAdc<'static>>;
pub type Auger = StepDirStepper<Output<'static>, Delay>;

/// Everything the control loop drives
pub struct Control {
    pub rtc: Rtc,
    pub reporter: Reporter,
    pub switch: Switch,
    pub auger: Auger,
    pub portions: Portions,
    pub schedule: FeedSchedule,
}

impl Control {
    /// Read the clock and report the time, or report the failure
    fn report_time(&mut self) {
        let result = match self.rtc.read_time() {
            Ok(now) => self.reporter.time(&now),
            Err(e) => {
                warn!("RTC read failed: {:?}", e);
                self.reporter.rtc_error()
            }
        };
        if let Err(e) = result {
            warn!("Report failed: {:?}", e);
        }
    }

    /// Read the switch, report its label, and turn out one portion
    fn dispense(&mut self) {
        let mode = match self.switch.read() {
            Ok(mode) => mode,
            Err(e) => {
                warn!("Feed switch read failed: {:?}", e);
                self.switch.current()
            }
        };
        if let Err(e) = self.reporter.feed_mode(mode) {
            warn!("Report failed: {:?}", e);
        }

        let steps = self.portions.steps_for(mode);
        info!("Dispensing {} steps ({})", steps, mode.label());
        if let Err(e) = self.auger.dispense(steps) {
            error!("Dispense failed: {:?}", e);
        }
    }

    /// Button press: always feeds, even if the clock cannot be read
    fn manual_feed(&mut self) {
        self.report_time();
        self.dispense();
    }

    /// Schedule tick: feeds once for a daily time that has come due
    fn scheduled_feed(&mut self) {
        if self.schedule.is_empty() {
            return;
        }

        let now = match self.rtc.read_time() {
            Ok(now) => now,
            Err(e) => {
                warn!("RTC read failed: {:?}", e);
                return;
            }
        };
        if let Err(e) = now.validate() {
            warn!("Clock not set ({:?}), schedule skipped", e);
            return;
        }

        if let Some(due) = self.schedule.poll(&now) {
            let at = feed_time_today(due, &now);
            info!(
                "Scheduled feed {}:{} on {}/{}",
                at.hours,
                at.minutes,
                at.display_month(),
                at.day
            );
            if let Err(e) = self.reporter.time(&now) {
                warn!("Report failed: {:?}", e);
            }
            self.dispense();
        }
    }
}

#[embassy_executor::task]
pub async fn control_task(mut control: Control) {
    info!("Control task started");

    loop {
        match EVENTS.receive().await {
            Event::FeedButton => {
                if FEED_REQUEST.is_raised() {
                    control.manual_feed();
                    // Re-arm the button only once the feed is done
                    FEED_REQUEST.take();
                }
            }
            Event::ScheduleTick => control.scheduled_feed(),
        }
    }
}
