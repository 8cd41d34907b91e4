//! Configuration types
//!
//! Board-agnostic feeder configuration. The firmware fills it in at build
//! time from `feeder.toml`.

pub mod types;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::feed::{FeedThresholds, MAX_FEED_TIMES};
use crate::time::TimeOfDay;
use crate::traits::SquareWave;

pub use types::*;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Bus address outside the 7-bit non-reserved range
    InvalidAddress(u8),
    /// Bus clock zero, or too fast for the bit-rate generator
    InvalidBusFrequency,
    /// Threshold bands empty or inverted
    InvalidThresholds,
    /// Portion of zero steps
    InvalidPortion,
    /// Zero-length step pulse
    InvalidPulseWidth,
    /// Feed time outside the day
    InvalidFeedTime(usize),
    /// More feed times than the schedule holds
    TooManyFeedTimes,
    /// Zero baud rate
    InvalidBaudrate,
    /// Zero schedule interval
    InvalidPollInterval,
}

/// Feeder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeederConfig {
    /// Real-time clock 7-bit address
    pub rtc_address: u8,
    pub bus: BusSettings,
    pub sample_mode: SampleMode,
    /// Feed switch ADC band edges
    pub thresholds: FeedThresholds,
    pub portions: Portions,
    /// Step pulse high and low time
    pub step_pulse_us: u32,
    /// Daily automatic feed times
    pub feed_times: Vec<TimeOfDay, MAX_FEED_TIMES>,
    /// Square-wave output applied at boot
    pub square_wave: SquareWave,
    /// Status report serial baud rate
    pub report_baudrate: u32,
    /// Seconds between schedule checks
    pub schedule_poll_secs: u32,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            rtc_address: DEFAULT_RTC_ADDRESS,
            bus: BusSettings::default(),
            sample_mode: SampleMode::default(),
            thresholds: FeedThresholds::default(),
            portions: Portions::default(),
            step_pulse_us: 1000,
            feed_times: Vec::new(),
            square_wave: SquareWave::default(),
            report_baudrate: 9600,
            schedule_poll_secs: 30,
        }
    }
}

impl FeederConfig {
    /// Replace the feed times
    ///
    /// Returns [`ConfigError::TooManyFeedTimes`] and leaves the list
    /// unchanged if `times` does not fit.
    pub fn set_feed_times(&mut self, times: &[TimeOfDay]) -> Result<(), ConfigError> {
        let list = Vec::from_slice(times).map_err(|_| ConfigError::TooManyFeedTimes)?;
        self.feed_times = list;
        Ok(())
    }

    /// Check the configuration for values the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 0x00-0x07 and 0x78-0x7F are reserved
        if !(0x08..=0x77).contains(&self.rtc_address) {
            return Err(ConfigError::InvalidAddress(self.rtc_address));
        }

        let bus = &self.bus;
        if bus.frequency_hz == 0 || bus.cpu_frequency_hz < bus.frequency_hz.saturating_mul(16) {
            return Err(ConfigError::InvalidBusFrequency);
        }

        if !self.thresholds.is_valid() {
            return Err(ConfigError::InvalidThresholds);
        }

        let p = &self.portions;
        if p.low == 0 || p.medium == 0 || p.high == 0 {
            return Err(ConfigError::InvalidPortion);
        }

        if self.step_pulse_us == 0 {
            return Err(ConfigError::InvalidPulseWidth);
        }

        if let Some(index) = self.feed_times.iter().position(|t| !t.is_valid()) {
            return Err(ConfigError::InvalidFeedTime(index));
        }

        if self.report_baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }

        if self.schedule_poll_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedMode;
    use crate::twi::WaitPolicy;

    #[test]
    fn test_default_is_valid() {
        let config = FeederConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.rtc_address, 0x68);
        assert_eq!(config.bus.wait_policy(), WaitPolicy::Forever);
        assert_eq!(config.bus.twi_config().bit_rate_register(), 72);
    }

    #[test]
    fn test_reserved_address_rejected() {
        let config = FeederConfig {
            rtc_address: 0x7F,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidAddress(0x7F)));
    }

    #[test]
    fn test_bus_too_fast_for_cpu() {
        let mut config = FeederConfig::default();
        config.bus.frequency_hz = 2_000_000;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBusFrequency));

        // f_cpu / 16 is a bit-rate register of zero, still reachable
        config.bus.frequency_hz = config.bus.cpu_frequency_hz / 16;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_feed_times() {
        let mut config = FeederConfig::default();
        config
            .set_feed_times(&[TimeOfDay::new(7, 0, 0), TimeOfDay::new(25, 0, 0)])
            .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidFeedTime(1)));

        let too_many = [TimeOfDay::new(7, 0, 0); MAX_FEED_TIMES + 1];
        assert_eq!(
            config.set_feed_times(&too_many),
            Err(ConfigError::TooManyFeedTimes)
        );
        assert_eq!(config.feed_times.len(), 2);
    }

    #[test]
    fn test_portion_lookup() {
        let portions = Portions {
            low: 100,
            medium: 200,
            high: 400,
        };
        assert_eq!(portions.steps_for(FeedMode::Medium), 200);
        assert_eq!(portions.steps_for(FeedMode::High), 400);
    }

    #[test]
    fn test_zero_portion_rejected() {
        let mut config = FeederConfig::default();
        config.portions.low = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPortion));
    }

    #[test]
    fn test_zero_wait_spins_is_forever() {
        assert_eq!(BusSettings::default().wait_policy(), WaitPolicy::Forever);

        let bus = BusSettings {
            wait_spins: 0,
            ..Default::default()
        };
        assert_eq!(bus.wait_policy(), WaitPolicy::Forever);
    }

    #[test]
    fn test_wait_spins_bound_the_wait() {
        let bus = BusSettings {
            wait_spins: 2000,
            ..Default::default()
        };
        assert_eq!(bus.wait_policy(), WaitPolicy::Spins(2000));
    }
}
