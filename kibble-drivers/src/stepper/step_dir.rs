//! Step-pulse stepper output
//!
//! Drives the STEP input of a stepper driver (A4988, DRV8825, TMC in
//! standalone mode). Direction is fixed by wiring; the auger only turns
//! one way.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use kibble_core::traits::{DispenseError, Dispenser};

/// Default high and low time of one step pulse
pub const DEFAULT_PULSE_US: u32 = 1_000;

/// Stepper driven by a single STEP pin
pub struct StepDirStepper<P, D> {
    step: P,
    delay: D,
    pulse_us: u32,
    steps_taken: u32,
}

impl<P: OutputPin, D: DelayNs> StepDirStepper<P, D> {
    /// Create a stepper; the step pin is driven low immediately
    ///
    /// # Arguments
    /// - `step`: STEP output
    /// - `delay`: blocking delay used to time pulses
    /// - `pulse_us`: high time and low time of each pulse
    pub fn new(mut step: P, delay: D, pulse_us: u32) -> Self {
        let _ = step.set_low();
        Self {
            step,
            delay,
            pulse_us,
            steps_taken: 0,
        }
    }

    /// Total steps issued since creation
    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    pub fn release(self) -> (P, D) {
        (self.step, self.delay)
    }

    fn pulse(&mut self) -> Result<(), DispenseError> {
        self.step.set_high().map_err(|_| DispenseError::Pin)?;
        self.delay.delay_us(self.pulse_us);
        self.step.set_low().map_err(|_| DispenseError::Pin)?;
        self.delay.delay_us(self.pulse_us);
        self.steps_taken = self.steps_taken.wrapping_add(1);
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> Dispenser for StepDirStepper<P, D> {
    fn dispense(&mut self, steps: u16) -> Result<(), DispenseError> {
        for _ in 0..steps {
            self.pulse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock STEP pin counting rising edges
    #[derive(Default)]
    struct MockPin {
        high: bool,
        rising: u32,
        fail_after: Option<u32>,
    }

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for MockPin {
        type Error = PinFault;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), PinFault> {
            if self.fail_after.is_some_and(|n| self.rising >= n) {
                return Err(PinFault);
            }
            if !self.high {
                self.rising += 1;
            }
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), PinFault> {
            self.high = false;
            Ok(())
        }
    }

    /// Delay that accumulates requested time
    #[derive(Default)]
    struct Clock {
        elapsed_ns: u64,
    }

    impl DelayNs for Clock {
        fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_dispense_pulses_and_timing() {
        let mut stepper = StepDirStepper::new(MockPin::default(), Clock::default(), DEFAULT_PULSE_US);

        stepper.dispense(200).unwrap();
        assert_eq!(stepper.steps_taken(), 200);

        let (pin, clock) = stepper.release();
        assert_eq!(pin.rising, 200);
        assert!(!pin.high);
        // 200 steps * (1 ms high + 1 ms low)
        assert_eq!(clock.elapsed_ns, 400_000_000);
    }

    #[test]
    fn test_zero_steps_is_noop() {
        let mut stepper = StepDirStepper::new(MockPin::default(), Clock::default(), 10);
        stepper.dispense(0).unwrap();
        assert_eq!(stepper.steps_taken(), 0);
    }

    #[test]
    fn test_pin_error_stops_dispensing() {
        let pin = MockPin {
            fail_after: Some(3),
            ..Default::default()
        };
        let mut stepper = StepDirStepper::new(pin, Clock::default(), 10);

        assert_eq!(stepper.dispense(10), Err(DispenseError::Pin));
        assert_eq!(stepper.steps_taken(), 3);
    }

    #[test]
    fn test_infallible_pin_type_compiles() {
        struct Pin;
        impl ErrorType for Pin {
            type Error = Infallible;
        }
        impl OutputPin for Pin {
            fn set_high(&mut self) -> Result<(), Infallible> {
                Ok(())
            }
            fn set_low(&mut self) -> Result<(), Infallible> {
                Ok(())
            }
        }
        let mut stepper = StepDirStepper::new(Pin, Clock::default(), 1);
        assert_eq!(stepper.dispense(5), Ok(()));
    }
}
