//! Serial status report
//!
//! Human-readable lines on the serial link. Every line ends in CRLF and
//! any bare `\n` inside a message is expanded to `\r\n`.

use core::fmt::Write as _;

use heapless::String;
use kibble_hal::uart::UartTx;

use crate::feed::FeedMode;
use crate::time::CalendarTime;

/// Longest formatted line
pub const MAX_LINE_LEN: usize = 32;

/// Written once at boot
pub const START_MESSAGE: &str = "Prog Start:";
/// Written when the bus could not be brought up
pub const BUS_ERROR_MESSAGE: &str = "TWI ERROR";
/// Written when reading the clock fails
pub const RTC_ERROR_MESSAGE: &str = "Failed to read from RTC";

/// Errors writing a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError<E> {
    /// The transmitter failed
    Uart(E),
    /// Formatted text did not fit the line buffer
    Overflow,
}

/// Format a time as `HH:MM:SS MM/DD/YYYY`, month 1-based
pub fn format_time(time: &CalendarTime) -> Result<String<MAX_LINE_LEN>, core::fmt::Error> {
    let mut line = String::new();
    write!(
        line,
        "{:02}:{:02}:{:02} {:02}/{:02}/{:04}",
        time.hours,
        time.minutes,
        time.seconds,
        time.display_month(),
        time.day,
        time.full_year()
    )?;
    Ok(line)
}

/// Line-oriented writer over a UART transmitter
pub struct StatusReporter<T> {
    tx: T,
}

impl<T: UartTx> StatusReporter<T> {
    pub fn new(tx: T) -> Self {
        Self { tx }
    }

    /// Give the transmitter back
    pub fn release(self) -> T {
        self.tx
    }

    /// Write `text` followed by CRLF
    pub fn line(&mut self, text: &str) -> Result<(), ReportError<T::Error>> {
        let mut rest = text;
        while let Some(pos) = rest.find('\n') {
            let (head, tail) = rest.split_at(pos);
            self.raw(head.as_bytes())?;
            self.raw(b"\r\n")?;
            rest = &tail[1..];
        }
        self.raw(rest.as_bytes())?;
        self.raw(b"\r\n")?;
        self.tx.flush().map_err(ReportError::Uart)
    }

    pub fn start(&mut self) -> Result<(), ReportError<T::Error>> {
        self.line(START_MESSAGE)
    }

    pub fn bus_error(&mut self) -> Result<(), ReportError<T::Error>> {
        self.line(BUS_ERROR_MESSAGE)
    }

    pub fn rtc_error(&mut self) -> Result<(), ReportError<T::Error>> {
        self.line(RTC_ERROR_MESSAGE)
    }

    pub fn time(&mut self, time: &CalendarTime) -> Result<(), ReportError<T::Error>> {
        let text = format_time(time).map_err(|_| ReportError::Overflow)?;
        self.line(&text)
    }

    pub fn feed_mode(&mut self, mode: FeedMode) -> Result<(), ReportError<T::Error>> {
        self.line(mode.label())
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<(), ReportError<T::Error>> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.tx.write_blocking(bytes).map_err(ReportError::Uart)
    }
}
