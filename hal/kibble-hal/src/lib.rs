//! Kibble Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. The feeder logic in `kibble-core` and
//! `kibble-drivers` only ever sees these traits, which is also what lets
//! the bus engine and the clock codec run against simulated peripherals
//! on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  kibble-firmware                        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ kibble-core   │       │ kibble-drivers│
//! └───────────────┘       └───────────────┘
//!         │                       │
//!         └───────────┬───────────┘
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kibble-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     ▲
//!                     │
//!         ┌───────────────────────┐
//!         │   kibble-hal-rp2040   │
//!         └───────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`twi::TwiHardware`] - Register-level two-wire interface peripheral
//! - [`twi::TwiBus`] - Whole-transaction two-wire bus master
//! - [`gpio::OpenDrainPin`] - Open-drain line for bit-banged buses
//! - [`uart::UartTx`] - Serial transmit
//! - [`adc::AnalogInput`] - Single analog channel

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod twi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use gpio::OpenDrainPin;
pub use twi::{TwiBus, TwiHardware};
pub use uart::UartTx;
