//! Dispensing motor trait
//!
//! The auger is driven by a stepper; one portion is a fixed number of
//! steps. Implementations block until the last step has been issued.

/// Errors from the dispensing motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispenseError {
    /// The step output could not be driven
    Pin,
}

/// Trait for the dispensing motor
pub trait Dispenser {
    /// Turn the motor `steps` full steps
    fn dispense(&mut self, steps: u16) -> Result<(), DispenseError>;
}

impl<T: Dispenser + ?Sized> Dispenser for &mut T {
    fn dispense(&mut self, steps: u16) -> Result<(), DispenseError> {
        (**self).dispense(steps)
    }
}
