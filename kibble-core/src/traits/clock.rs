//! Real-time clock trait
//!
//! Abstracts the battery-backed clock chip so the control loop can be
//! exercised without one.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::CalendarTime;

/// Square-wave output on/off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SquareWaveEnable {
    #[default]
    Off = 0,
    On = 1,
}

/// OUT bit of the control register, only written while the square wave is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputLevel {
    #[default]
    Low = 0,
    High = 1,
}

/// Square-wave output rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SquareWaveFrequency {
    /// 1 Hz
    #[default]
    Hz1 = 0,
    /// 4.096 kHz
    KHz4 = 1,
    /// 8.192 kHz
    KHz8 = 2,
    /// 32.768 kHz
    KHz32 = 3,
}

impl SquareWaveFrequency {
    /// Rate-select bits
    pub const fn rate_select(self) -> u8 {
        self as u8
    }
}

/// Complete square-wave output setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SquareWave {
    pub enable: SquareWaveEnable,
    pub level: OutputLevel,
    pub frequency: SquareWaveFrequency,
}

/// Trait for real-time clock chips
pub trait RealTimeClock {
    /// Error type for bus access
    type Error;

    /// Read the current date and time
    ///
    /// Nothing is returned unless the whole register block was read.
    fn now(&mut self) -> Result<CalendarTime, Self::Error>;

    /// Set the date and time and start the oscillator
    fn set(&mut self, time: &CalendarTime) -> Result<(), Self::Error>;

    /// Configure the square-wave output pin
    fn set_square_wave(&mut self, wave: SquareWave) -> Result<(), Self::Error>;
}
