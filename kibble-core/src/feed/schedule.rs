//! Daily feed schedule
//!
//! A list of times of day. Each is served at most once per calendar day,
//! on the first poll at or after it.

use heapless::Vec;

use crate::time::{CalendarTime, TimeOfDay};

/// Most feed times a schedule can hold
pub const MAX_FEED_TIMES: usize = 8;

/// Move a daily feed time onto the date of `now`
pub fn feed_time_today(feed: TimeOfDay, now: &CalendarTime) -> CalendarTime {
    now.with_time_of_day(feed)
}

/// Feed times and which of them have been served today
#[derive(Debug, Clone)]
pub struct FeedSchedule {
    times: Vec<TimeOfDay, MAX_FEED_TIMES>,
    served: [bool; MAX_FEED_TIMES],
    day: Option<u32>,
}

impl FeedSchedule {
    /// Build from a list of feed times; extra entries are dropped
    pub fn new(times: &[TimeOfDay]) -> Self {
        let mut list = Vec::new();
        for time in times.iter().take(MAX_FEED_TIMES) {
            let _ = list.push(*time);
        }
        Self {
            times: list,
            served: [false; MAX_FEED_TIMES],
            day: None,
        }
    }

    pub fn times(&self) -> &[TimeOfDay] {
        &self.times
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Mark everything already past at `now` as served
    ///
    /// Call once at boot so a restart in the evening does not replay the
    /// morning's feeds.
    pub fn prime(&mut self, now: &CalendarTime) {
        self.roll_day(now);
        let current = now.time_of_day();
        for (served, time) in self.served.iter_mut().zip(self.times.iter()) {
            *served = *time <= current;
        }
    }

    /// Return the feed time due at `now`, marking it served
    ///
    /// At most one time is returned per call. If several have come due
    /// since the last poll they are returned on successive calls.
    pub fn poll(&mut self, now: &CalendarTime) -> Option<TimeOfDay> {
        self.roll_day(now);
        let current = now.time_of_day();
        for (served, time) in self.served.iter_mut().zip(self.times.iter()) {
            if !*served && *time <= current {
                *served = true;
                return Some(*time);
            }
        }
        None
    }

    fn roll_day(&mut self, now: &CalendarTime) {
        let today = now.day_key();
        if self.day != Some(today) {
            self.day = Some(today);
            self.served = [false; MAX_FEED_TIMES];
        }
    }
}
