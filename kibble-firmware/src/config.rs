//! Build-time configuration
//!
//! `build.rs` parses and validates `feeder.toml` and generates
//! [`feeder_config`] from it.

use kibble_core::config::{BusSettings, FeederConfig, Portions, SampleMode};
use kibble_core::feed::FeedThresholds;
use kibble_core::time::TimeOfDay;
use kibble_core::traits::{OutputLevel, SquareWave, SquareWaveEnable, SquareWaveFrequency};

include!(concat!(env!("OUT_DIR"), "/feeder_config.rs"));
