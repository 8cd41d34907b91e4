//! Portion switch ADC
//!
//! Wraps the RP2040's blocking 12-bit converter and the one channel the
//! switch divider is wired to (ADC0 on GPIO26 on the feeder board).

use embassy_rp::adc::{self, Adc, Blocking, Channel};

use kibble_hal::AnalogInput;

/// Portion switch input: one blocking ADC plus the channel it samples
pub struct SwitchAdc<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> SwitchAdc<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl AnalogInput for SwitchAdc<'_> {
    type Error = adc::Error;

    fn read_blocking(&mut self) -> Result<u16, Self::Error> {
        self.adc.blocking_read(&mut self.channel)
    }
}
