//! Stepper driver implementations

pub mod step_dir;

pub use step_dir::{StepDirStepper, DEFAULT_PULSE_US};
