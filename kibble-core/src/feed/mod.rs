//! Feeding decisions: how much, and when

pub mod mode;
pub mod schedule;

pub use mode::{FeedMode, FeedThresholds};
pub use schedule::{feed_time_today, FeedSchedule, MAX_FEED_TIMES};
