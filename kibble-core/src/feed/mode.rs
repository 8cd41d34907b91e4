//! Feed amount selected on the front-panel switch
//!
//! The switch is a resistor ladder read by an ADC channel. Two thresholds
//! split the reading into three bands.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Portion size chosen by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FeedMode {
    Low,
    Medium,
    High,
}

impl FeedMode {
    /// Label written to the status report
    pub const fn label(self) -> &'static str {
        match self {
            FeedMode::Low => "FeedLow",
            FeedMode::Medium => "FeedMed",
            FeedMode::High => "FeedHigh",
        }
    }

    /// Position of the mode in `[Low, Medium, High]`
    pub const fn index(self) -> usize {
        match self {
            FeedMode::Low => 0,
            FeedMode::Medium => 1,
            FeedMode::High => 2,
        }
    }
}

/// ADC band edges between the feed modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeedThresholds {
    /// Readings below this are [`FeedMode::Low`]
    pub low_to_medium: u16,
    /// Readings at or above this are [`FeedMode::High`]
    pub medium_to_high: u16,
}

impl Default for FeedThresholds {
    /// Thirds of a 10-bit converter's range
    fn default() -> Self {
        Self::TEN_BIT
    }
}

impl FeedThresholds {
    /// Band edges for a 10-bit converter
    pub const TEN_BIT: Self = Self {
        low_to_medium: 256,
        medium_to_high: 768,
    };

    /// Same band edges on a converter with `bits` of resolution
    pub const fn for_resolution(bits: u8) -> Self {
        let ten = Self::TEN_BIT;
        if bits >= 10 {
            let shift = bits - 10;
            Self {
                low_to_medium: ten.low_to_medium << shift,
                medium_to_high: ten.medium_to_high << shift,
            }
        } else {
            let shift = 10 - bits;
            Self {
                low_to_medium: ten.low_to_medium >> shift,
                medium_to_high: ten.medium_to_high >> shift,
            }
        }
    }

    /// Map a raw reading onto a feed mode
    pub const fn decode(&self, reading: u16) -> FeedMode {
        if reading < self.low_to_medium {
            FeedMode::Low
        } else if reading < self.medium_to_high {
            FeedMode::Medium
        } else {
            FeedMode::High
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.low_to_medium < self.medium_to_high
    }
}
