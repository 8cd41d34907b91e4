//! Two-wire bus master
//!
//! [`BusController`] wraps one [`kibble_hal::twi::TwiHardware`] and issues
//! single bus primitives. [`TransactionEngine`] composes them into whole
//! read, write and repeated-start transactions.

pub mod controller;
pub mod engine;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod status;

pub use controller::{AckPolicy, BusController, BusState, WaitPolicy};
pub use engine::{Phase, TransactionEngine};
pub use status::{TwiError, TwiStatus};
