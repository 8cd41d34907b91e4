//! Analog input abstraction

/// A single analog channel
///
/// Takes `&mut self` because conversions typically require mutable
/// access to the converter.
pub trait AnalogInput {
    /// Error type for conversions
    type Error;

    /// Start a conversion and block until the result is available
    fn read_blocking(&mut self) -> Result<u16, Self::Error>;
}
