//! Hardware abstraction traits
//!
//! These traits define the interface between the feeding logic and the
//! device drivers.

pub mod clock;
pub mod stepper;

pub use clock::{OutputLevel, RealTimeClock, SquareWave, SquareWaveEnable, SquareWaveFrequency};
pub use stepper::{DispenseError, Dispenser};
