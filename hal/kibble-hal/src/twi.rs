//! Two-wire interface (TWI / I2C) abstractions
//!
//! Two layers are exposed:
//!
//! - [`TwiHardware`] is the register-level view of a TWI peripheral in
//!   the style of the AVR TWI unit: the master issues one command per bus
//!   phase, polls a completion flag, and reads back a status code from
//!   [`code`] describing what happened on the wire.
//! - [`TwiBus`] is the whole-transaction view used by device drivers.

/// Raw status codes reported by [`TwiHardware::status`]
///
/// Values are the status register with the prescaler bits masked off.
pub mod code {
    /// A START condition has been transmitted
    pub const START: u8 = 0x08;
    /// A repeated START condition has been transmitted
    pub const REPEATED_START: u8 = 0x10;
    /// SLA+W transmitted, ACK received
    pub const MT_SLA_ACK: u8 = 0x18;
    /// SLA+W transmitted, NACK received
    pub const MT_SLA_NACK: u8 = 0x20;
    /// Data byte transmitted, ACK received
    pub const MT_DATA_ACK: u8 = 0x28;
    /// Data byte transmitted, NACK received
    pub const MT_DATA_NACK: u8 = 0x30;
    /// Arbitration lost in SLA+R/W or data bytes
    pub const ARB_LOST: u8 = 0x38;
    /// SLA+R transmitted, ACK received
    pub const MR_SLA_ACK: u8 = 0x40;
    /// SLA+R transmitted, NACK received
    pub const MR_SLA_NACK: u8 = 0x48;
    /// Data byte received, ACK returned
    pub const MR_DATA_ACK: u8 = 0x50;
    /// Data byte received, NACK returned
    pub const MR_DATA_NACK: u8 = 0x58;
    /// No relevant state information available
    pub const NO_INFO: u8 = 0xF8;
    /// Bus error due to an illegal START or STOP condition
    pub const BUS_ERROR: u8 = 0x00;

    /// Mask applied to the status register to drop the prescaler bits
    pub const STATUS_MASK: u8 = 0xF8;
}

/// Transfer direction carried in the R/W bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (R/W = 0)
    Write,
    /// Master receives (R/W = 1)
    Read,
}

impl Direction {
    /// Build the address byte for a 7-bit address
    pub const fn address_byte(self, address: u8) -> u8 {
        let rw = match self {
            Direction::Write => 0,
            Direction::Read => 1,
        };
        (address << 1) | rw
    }
}

/// One bus phase requested from the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiCommand {
    /// Signal START, or repeated START while the bus is held
    Start,
    /// Signal STOP and release the bus
    Stop,
    /// Shift a byte out (address or data)
    Transmit(u8),
    /// Shift a byte in, answering with ACK (`ack = true`) or NACK
    Receive {
        /// Acknowledge the byte so the device keeps sending
        ack: bool,
    },
}

/// Register-level TWI peripheral
///
/// Implementations own the physical bus pins. Every command except
/// [`TwiCommand::Stop`] completes by raising the completion flag;
/// [`TwiCommand::Stop`] completes by clearing the stop-pending flag.
pub trait TwiHardware {
    /// Power the peripheral and program the bit rate
    fn enable(&mut self, config: &TwiConfig);

    /// Disable the peripheral and release the pins
    fn disable(&mut self);

    /// Check whether the peripheral is enabled
    fn is_enabled(&self) -> bool;

    /// Clear the completion flag and start the given bus phase
    fn issue(&mut self, command: TwiCommand);

    /// Completion flag (TWINT on AVR)
    fn is_complete(&self) -> bool;

    /// Stop-pending flag (TWSTO on AVR)
    fn is_stop_pending(&self) -> bool;

    /// Status code of the last completed phase, see [`code`]
    fn status(&self) -> u8;

    /// Data register: the last byte received
    fn data(&self) -> u8;
}

/// Whole-transaction TWI bus master
///
/// Each call is a complete transaction from the caller's point of view.
pub trait TwiBus {
    /// Error type for bus operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `buf` - Buffer to read into; its length is the transfer length
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `write_data` - Bytes to write (typically a register pointer)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// TWI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
    /// Peripheral input clock in Hz
    pub cpu_frequency: u32,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TwiConfig {
    /// Standard mode (100 kHz) from a 16 MHz clock
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        cpu_frequency: 16_000_000,
    };

    /// Fast mode (400 kHz) from a 16 MHz clock
    pub const FAST: Self = Self {
        frequency: 400_000,
        cpu_frequency: 16_000_000,
    };

    /// Bit-rate register value for a prescaler of 1
    ///
    /// `f_scl = f_cpu / (16 + 2 * TWBR)`, clamped to the register range.
    pub const fn bit_rate_register(&self) -> u8 {
        if self.frequency == 0 {
            return u8::MAX;
        }
        let ratio = self.cpu_frequency / self.frequency;
        if ratio <= 16 {
            return 0;
        }
        let twbr = (ratio - 16) / 2;
        if twbr > u8::MAX as u32 {
            u8::MAX
        } else {
            twbr as u8
        }
    }

    /// Half of one SCL period in microseconds, for bit-banged buses
    pub const fn half_period_us(&self) -> u32 {
        if self.frequency == 0 {
            return 1;
        }
        let half = 500_000 / self.frequency;
        if half == 0 {
            1
        } else {
            half
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_byte() {
        assert_eq!(Direction::Write.address_byte(0x68), 0xD0);
        assert_eq!(Direction::Read.address_byte(0x68), 0xD1);
    }

    #[test]
    fn test_bit_rate_register() {
        // 16 MHz / 100 kHz = 160 -> (160 - 16) / 2 = 72
        assert_eq!(TwiConfig::STANDARD.bit_rate_register(), 72);
        // 16 MHz / 400 kHz = 40 -> (40 - 16) / 2 = 12
        assert_eq!(TwiConfig::FAST.bit_rate_register(), 12);

        let slow = TwiConfig {
            frequency: 1_000,
            cpu_frequency: 16_000_000,
        };
        assert_eq!(slow.bit_rate_register(), u8::MAX);
    }

    #[test]
    fn test_half_period() {
        assert_eq!(TwiConfig::STANDARD.half_period_us(), 5);
        assert_eq!(TwiConfig::FAST.half_period_us(), 1);
    }
}
