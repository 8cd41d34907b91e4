//! Interrupt-to-task event flags
//!
//! An interrupt handler (or an edge-waiting task standing in for one)
//! raises a flag; the control loop takes it. Raising an already raised
//! flag is a no-op, the same as masking the interrupt until the flag is
//! serviced.

use portable_atomic::{AtomicBool, Ordering};

/// Why the control loop woke up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Operator pressed the feed button
    FeedButton,
    /// Periodic schedule check
    ScheduleTick,
}

/// Single-producer, single-consumer event flag
pub struct EventFlag {
    raised: AtomicBool,
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Raise the flag
    ///
    /// Returns `true` if this call raised it, `false` if it was already
    /// pending.
    pub fn raise(&self) -> bool {
        !self.raised.swap(true, Ordering::AcqRel)
    }

    /// Clear the flag, returning whether it was raised
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
