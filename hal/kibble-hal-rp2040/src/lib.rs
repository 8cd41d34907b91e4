//! RP2040-specific HAL for the Kibble feeder firmware
//!
//! This crate provides RP2040 implementations of the `kibble-hal` traits:
//!
//! - Open-drain GPIO lines for the bit-banged two-wire bus
//! - Blocking UART transmitter for status reports
//! - ADC channel for the portion selector switch

#![no_std]

pub mod adc;
pub mod gpio;
pub mod uart;

pub use adc::SwitchAdc;
pub use gpio::FlexOpenDrain;
pub use uart::{uart_config, BlockingTx};
