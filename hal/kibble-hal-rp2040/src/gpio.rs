//! Open-drain GPIO lines
//!
//! The RP2040 has no true open-drain mode, so a line is emulated with a
//! flexible pin: releasing switches it to an input with the pull-up
//! enabled, driving low switches it to an output that is already low.

use embassy_rp::gpio::{Flex, Pull};

use kibble_hal::OpenDrainPin;

/// Flexible GPIO used as an open-drain bus line
pub struct FlexOpenDrain<'d> {
    pin: Flex<'d>,
}

impl<'d> FlexOpenDrain<'d> {
    /// Take over a pin, leaving the line released
    pub fn new(mut pin: Flex<'d>) -> Self {
        pin.set_pull(Pull::Up);
        pin.set_low();
        pin.set_as_input();
        Self { pin }
    }
}

impl OpenDrainPin for FlexOpenDrain<'_> {
    fn drive_low(&mut self) {
        self.pin.set_low();
        self.pin.set_as_output();
    }

    fn release(&mut self) {
        self.pin.set_as_input();
    }

    fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}
