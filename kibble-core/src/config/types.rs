//! Configuration building blocks

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use kibble_hal::twi::TwiConfig;

use crate::feed::FeedMode;
use crate::twi::WaitPolicy;

/// DS1307 7-bit bus address
pub const DEFAULT_RTC_ADDRESS: u8 = 0x68;

/// Two-wire bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusSettings {
    /// SCL frequency in Hz
    pub frequency_hz: u32,
    /// Clock feeding the bit-rate generator
    pub cpu_frequency_hz: u32,
    /// Polls of a hardware flag before giving up; 0 waits forever
    pub wait_spins: u32,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            frequency_hz: TwiConfig::STANDARD.frequency,
            cpu_frequency_hz: TwiConfig::STANDARD.cpu_frequency,
            wait_spins: 0,
        }
    }
}

impl BusSettings {
    pub const fn twi_config(&self) -> TwiConfig {
        TwiConfig {
            frequency: self.frequency_hz,
            cpu_frequency: self.cpu_frequency_hz,
        }
    }

    pub const fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::from_spins(self.wait_spins)
    }
}

/// Steps dispensed per feed mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Portions {
    pub low: u16,
    pub medium: u16,
    pub high: u16,
}

impl Default for Portions {
    /// One revolution of a 1.8° motor for every mode
    fn default() -> Self {
        Self {
            low: 200,
            medium: 200,
            high: 200,
        }
    }
}

impl Portions {
    pub const fn steps_for(&self, mode: FeedMode) -> u16 {
        match mode {
            FeedMode::Low => self.low,
            FeedMode::Medium => self.medium,
            FeedMode::High => self.high,
        }
    }
}

/// How the feed switch is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleMode {
    /// Convert on every read and block for the result
    #[default]
    Polling,
    /// Convert continuously in the background; reads return the latest
    FreeRunning,
}
