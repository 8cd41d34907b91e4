//! GPIO pin abstractions
//!
//! Provides the open-drain line used by bit-banged buses. The pin is
//! never driven high: "releasing" it lets the pull-up raise the line,
//! which is what allows a device to hold SCL low (clock stretching) or
//! pull SDA low (acknowledge).

/// Open-drain digital line
pub trait OpenDrainPin {
    /// Actively drive the line low
    fn drive_low(&mut self);

    /// Stop driving; the pull-up raises the line unless a device holds it
    fn release(&mut self);

    /// Sample the line level
    fn is_high(&self) -> bool;

    /// Sample the line level
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Drive low for `false`, release for `true`
    fn set_level(&mut self, high: bool) {
        if high {
            self.release();
        } else {
            self.drive_low();
        }
    }
}
