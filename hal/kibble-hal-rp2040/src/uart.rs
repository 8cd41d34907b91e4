//! UART transmitter for status reports

use embassy_rp::uart::{self, Blocking, DataBits, Parity, StopBits};

use kibble_hal::uart::{self as hal_uart, UartConfig};
use kibble_hal::UartTx;

/// Convert the portable UART settings into the RP2040 driver config
pub fn uart_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        hal_uart::DataBits::Seven => DataBits::DataBits7,
        hal_uart::DataBits::Eight => DataBits::DataBits8,
    };
    out.parity = match config.parity {
        hal_uart::Parity::None => Parity::ParityNone,
        hal_uart::Parity::Even => Parity::ParityEven,
        hal_uart::Parity::Odd => Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        hal_uart::StopBits::One => StopBits::STOP1,
        hal_uart::StopBits::Two => StopBits::STOP2,
    };
    out
}

/// Transmit half of a blocking RP2040 UART
pub struct BlockingTx<'d> {
    tx: uart::UartTx<'d, Blocking>,
}

impl<'d> BlockingTx<'d> {
    pub fn new(tx: uart::UartTx<'d, Blocking>) -> Self {
        Self { tx }
    }
}

impl UartTx for BlockingTx<'_> {
    type Error = uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.blocking_write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush()
    }
}
