//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in kibble-hal and kibble-core for the feeder's hardware:
//!
//! - Real-time clock (DS1307 over the two-wire bus)
//! - Bit-banged two-wire bus peripheral on open-drain GPIO
//! - Portion selector switch (polled or free-running ADC)
//! - Step-pulse stepper for the dispensing auger

#![no_std]
#![deny(unsafe_code)]

pub mod rtc;
pub mod sensor;
pub mod stepper;
pub mod twi;
