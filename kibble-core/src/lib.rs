//! Board-agnostic core logic for the kibble feeder firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Two-wire bus controller and transaction engine
//! - Calendar time and the daily feed schedule
//! - Feed-mode decoding for the portion switch
//! - Interrupt event flags
//! - Status report formatting
//! - Configuration type definitions
//! - Hardware abstraction traits (clock, dispenser)

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod events;
pub mod feed;
pub mod report;
pub mod time;
pub mod traits;
pub mod twi;
