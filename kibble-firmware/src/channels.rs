//! Inter-task communication channels
//!
//! Defines the statics the tasks use to talk to each other.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use kibble_core::events::{Event, EventFlag};
use kibble_drivers::sensor::LatestSample;

/// Channel capacity for control-loop wake-ups
const EVENT_CHANNEL_SIZE: usize = 4;

/// Pending feed request from the button
///
/// Stays raised until the control task has served it; presses in the
/// meantime are dropped.
pub static FEED_REQUEST: EventFlag = EventFlag::new();

/// Wake-ups for the control task
pub static EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> = Channel::new();

/// Latest feed switch conversion in free-running mode
pub static SWITCH_SAMPLE: LatestSample = LatestSample::new();
