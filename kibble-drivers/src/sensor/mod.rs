//! Sensor drivers

pub mod feed_switch;

pub use feed_switch::{FeedSwitch, LatestSample, Sampler};
