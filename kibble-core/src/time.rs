//! Calendar time as kept by the real-time clock

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Years are counted from this base
pub const YEAR_BASE: u16 = 1900;

/// Wall-clock date and time
///
/// Field ranges follow the C `struct tm` convention: `weekday` and
/// `month` are 0-based, `year` counts years since 1900.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalendarTime {
    /// 0-59
    pub seconds: u8,
    /// 0-59
    pub minutes: u8,
    /// 0-23
    pub hours: u8,
    /// 0-6
    pub weekday: u8,
    /// 1-31
    pub day: u8,
    /// 0-11
    pub month: u8,
    /// Years since 1900, at least 100
    pub year: u16,
}

/// Field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    Seconds,
    Minutes,
    Hours,
    Weekday,
    Day,
    Month,
    Year,
}

impl CalendarTime {
    /// Check every field against its range
    pub fn validate(&self) -> Result<(), TimeError> {
        if self.seconds > 59 {
            return Err(TimeError::Seconds);
        }
        if self.minutes > 59 {
            return Err(TimeError::Minutes);
        }
        if self.hours > 23 {
            return Err(TimeError::Hours);
        }
        if self.weekday > 6 {
            return Err(TimeError::Weekday);
        }
        if !(1..=31).contains(&self.day) {
            return Err(TimeError::Day);
        }
        if self.month > 11 {
            return Err(TimeError::Month);
        }
        // The device stores two year digits on top of 2000
        if !(100..=199).contains(&self.year) {
            return Err(TimeError::Year);
        }
        Ok(())
    }

    /// Same date at a different time of day
    pub fn with_time_of_day(self, time: TimeOfDay) -> Self {
        Self {
            hours: time.hours,
            minutes: time.minutes,
            seconds: time.seconds,
            ..self
        }
    }

    /// Time-of-day part
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        }
    }

    /// Four-digit year
    pub fn full_year(&self) -> u16 {
        YEAR_BASE + self.year
    }

    /// 1-based month for display
    pub fn display_month(&self) -> u8 {
        self.month.wrapping_add(1)
    }

    /// Ordinal of the calendar day, for "same day" comparisons
    pub fn day_key(&self) -> u32 {
        (u32::from(self.year) * 12 + u32::from(self.month)) * 32 + u32::from(self.day)
    }
}

/// Time within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeOfDay {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl TimeOfDay {
    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Seconds since midnight
    pub const fn seconds_of_day(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }

    pub fn is_valid(&self) -> bool {
        self.hours < 24 && self.minutes < 60 && self.seconds < 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CalendarTime {
        CalendarTime {
            seconds: 59,
            minutes: 59,
            hours: 23,
            weekday: 2,
            day: 15,
            month: 11,
            year: 124,
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_each_field() {
        let t = sample();
        assert_eq!(CalendarTime { seconds: 60, ..t }.validate(), Err(TimeError::Seconds));
        assert_eq!(CalendarTime { minutes: 60, ..t }.validate(), Err(TimeError::Minutes));
        assert_eq!(CalendarTime { hours: 24, ..t }.validate(), Err(TimeError::Hours));
        assert_eq!(CalendarTime { weekday: 7, ..t }.validate(), Err(TimeError::Weekday));
        assert_eq!(CalendarTime { day: 0, ..t }.validate(), Err(TimeError::Day));
        assert_eq!(CalendarTime { month: 12, ..t }.validate(), Err(TimeError::Month));
        assert_eq!(CalendarTime { year: 99, ..t }.validate(), Err(TimeError::Year));
    }

    #[test]
    fn test_display_fields() {
        let t = sample();
        assert_eq!(t.full_year(), 2024);
        assert_eq!(t.display_month(), 12);
    }

    #[test]
    fn test_with_time_of_day_keeps_date() {
        let t = sample().with_time_of_day(TimeOfDay::new(7, 30, 0));
        assert_eq!((t.hours, t.minutes, t.seconds), (7, 30, 0));
        assert_eq!((t.day, t.month, t.year), (15, 11, 124));
    }

    #[test]
    fn test_day_key_orders_days() {
        let t = sample();
        let next_year = CalendarTime { year: 125, month: 0, day: 1, ..t };
        assert!(next_year.day_key() > t.day_key());
        assert_eq!(t.with_time_of_day(TimeOfDay::new(0, 0, 0)).day_key(), t.day_key());
    }

    #[test]
    fn test_time_of_day_ordering() {
        assert!(TimeOfDay::new(7, 0, 0) < TimeOfDay::new(7, 0, 1));
        assert_eq!(TimeOfDay::new(1, 1, 1).seconds_of_day(), 3661);
        assert!(!TimeOfDay::new(24, 0, 0).is_valid());
    }
}
