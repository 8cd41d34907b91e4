//! Kibble - Pet Feeder Firmware
//!
//! Main firmware binary for RP2040-based feeders. Keeps time with a
//! DS1307 on a bit-banged two-wire bus, reads the portion switch, and
//! turns the auger on a button press or at the configured feed times.
//! Status lines go out on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_rp::uart::UartTx;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use kibble_core::config::SampleMode;
use kibble_core::feed::FeedSchedule;
use kibble_core::report::StatusReporter;
use kibble_core::twi::{TransactionEngine, TwiStatus};
use kibble_drivers::rtc::Ds1307;
use kibble_drivers::sensor::{FeedSwitch, Sampler};
use kibble_drivers::stepper::StepDirStepper;
use kibble_drivers::twi::BitBangTwi;
use kibble_hal::uart::UartConfig;
use kibble_hal_rp2040::{uart_config, BlockingTx, FlexOpenDrain, SwitchAdc};

use crate::channels::SWITCH_SAMPLE;
use crate::config::feeder_config;

mod channels;
mod config;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Kibble firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = feeder_config();

    // Status report link (UART0 TX: GPIO0)
    let uart_settings = UartConfig {
        baudrate: config.report_baudrate,
        ..Default::default()
    };
    let tx = UartTx::new_blocking(p.UART0, p.PIN_0, uart_config(&uart_settings));
    let mut reporter = StatusReporter::new(BlockingTx::new(tx));
    info!("UART initialized at {} baud", config.report_baudrate);

    // Two-wire bus (SDA: GPIO4, SCL: GPIO5)
    let sda = FlexOpenDrain::new(Flex::new(p.PIN_4));
    let scl = FlexOpenDrain::new(Flex::new(p.PIN_5));
    let twi = BitBangTwi::new(scl, sda, Delay);
    let mut engine = TransactionEngine::new(
        twi,
        config.bus.twi_config(),
        config.bus.wait_policy(),
    );
    match engine.init() {
        TwiStatus::Ok => info!("TWI bus at {} Hz", config.bus.frequency_hz),
        status => {
            error!("TWI init failed: {:?}", status);
            if let Err(e) = reporter.bus_error() {
                warn!("Report failed: {:?}", e);
            }
        }
    }

    let mut rtc = Ds1307::with_address(engine, config.rtc_address);

    if let Err(e) = reporter.start() {
        warn!("Report failed: {:?}", e);
    }

    let wave = config.square_wave;
    match rtc.configure_square_wave(wave.enable, wave.level, wave.frequency) {
        Ok(()) => debug!("Square wave set: {:?}", wave),
        Err(e) => warn!("Square wave setup failed: {:?}", e),
    }

    match rtc.is_running() {
        Ok(true) => {}
        Ok(false) => warn!("RTC oscillator halted, time is not being kept"),
        Err(e) => warn!("RTC status read failed: {:?}", e),
    }

    // Feeds already past today are not replayed after a restart
    let mut schedule = FeedSchedule::new(&config.feed_times);
    match rtc.read_time() {
        Ok(now) if now.validate().is_ok() => schedule.prime(&now),
        Ok(_) => warn!("RTC holds an invalid time, schedule starts unprimed"),
        Err(e) => warn!("RTC read failed: {:?}", e),
    }
    info!("{} daily feed times", schedule.times().len());

    // Portion switch (ADC0: GPIO26)
    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let channel = Channel::new_pin(p.PIN_26, Pull::None);
    let switch_adc = SwitchAdc::new(adc, channel);
    let switch = match config.sample_mode {
        SampleMode::Polling => FeedSwitch::polling(switch_adc, config.thresholds),
        SampleMode::FreeRunning => {
            spawner
                .spawn(tasks::sampler_task(Sampler::new(switch_adc, &SWITCH_SAMPLE)))
                .unwrap();
            FeedSwitch::free_running(&SWITCH_SAMPLE, config.thresholds)
        }
    };
    info!("Feed switch in {:?} mode", config.sample_mode);

    // Auger stepper (STEP: GPIO11)
    let step_pin = Output::new(p.PIN_11, Level::Low);
    let auger = StepDirStepper::new(step_pin, Delay, config.step_pulse_us);

    // Feed button (GPIO15, active high)
    let button = Input::new(p.PIN_15, Pull::Down);

    let control = tasks::Control {
        rtc,
        reporter,
        switch,
        auger,
        portions: config.portions,
        schedule,
    };

    spawner.spawn(tasks::control_task(control)).unwrap();
    spawner.spawn(tasks::button_task(button)).unwrap();
    spawner
        .spawn(tasks::schedule_task(config.schedule_poll_secs))
        .unwrap();

    info!("All tasks spawned");
}
