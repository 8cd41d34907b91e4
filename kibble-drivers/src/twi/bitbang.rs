//! Bit-banged TWI peripheral
//!
//! Drives SCL and SDA as two open-drain GPIO lines and reports every bus
//! phase with the same status codes an AVR TWI unit would. Each command
//! runs to completion inside [`TwiHardware::issue`], so the completion
//! flag is already raised when the controller starts polling.
//!
//! Timing: SDA only changes while SCL is low, except for START and STOP.
//! Every SCL release waits for the line to actually rise, which honours
//! clock stretching.

use embedded_hal::delay::DelayNs;
use kibble_hal::gpio::OpenDrainPin;
use kibble_hal::twi::{code, TwiCommand, TwiConfig, TwiHardware};

/// Microseconds a device may stretch the clock before the phase fails
pub const STRETCH_LIMIT_US: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    AwaitAddress,
    Transmitter,
    Receiver,
}

/// TWI master on two open-drain pins
pub struct BitBangTwi<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
    half_period_us: u32,
    enabled: bool,
    held: bool,
    mode: Mode,
    complete: bool,
    stop_pending: bool,
    stop_failed: bool,
    status: u8,
    data: u8,
}

impl<SCL, SDA, D> BitBangTwi<SCL, SDA, D>
where
    SCL: OpenDrainPin,
    SDA: OpenDrainPin,
    D: DelayNs,
{
    /// Take the two bus lines; both are released until [`TwiHardware::enable`]
    pub fn new(mut scl: SCL, mut sda: SDA, delay: D) -> Self {
        scl.release();
        sda.release();
        Self {
            scl,
            sda,
            delay,
            half_period_us: TwiConfig::STANDARD.half_period_us(),
            enabled: false,
            held: false,
            mode: Mode::Idle,
            complete: false,
            stop_pending: false,
            stop_failed: false,
            status: code::NO_INFO,
            data: 0xFF,
        }
    }

    /// Give the pins and delay back
    pub fn release(self) -> (SCL, SDA, D) {
        (self.scl, self.sda, self.delay)
    }

    fn half(&mut self) {
        self.delay.delay_us(self.half_period_us);
    }

    /// Release SCL and wait for it to rise
    fn scl_rise(&mut self) -> bool {
        self.scl.release();
        for _ in 0..STRETCH_LIMIT_US {
            if self.scl.is_high() {
                return true;
            }
            self.delay.delay_us(1);
        }
        self.scl.is_high()
    }

    fn lose_bus(&mut self, raw: u8) -> u8 {
        self.sda.release();
        self.scl.release();
        self.held = false;
        self.mode = Mode::Idle;
        raw
    }

    fn start(&mut self) -> u8 {
        let repeated = self.held;
        if repeated {
            self.sda.release();
            self.half();
            if !self.scl_rise() {
                return self.lose_bus(code::BUS_ERROR);
            }
            self.half();
        }

        // Someone else is holding the bus
        if self.sda.is_low() {
            return self.lose_bus(code::ARB_LOST);
        }

        self.sda.drive_low();
        self.half();
        self.scl.drive_low();
        self.half();

        self.held = true;
        self.mode = Mode::AwaitAddress;
        if repeated {
            code::REPEATED_START
        } else {
            code::START
        }
    }

    /// Clock one bit out; a high bit read back low is arbitration loss
    fn write_bit(&mut self, high: bool) -> Result<(), u8> {
        self.sda.set_level(high);
        self.half();
        if !self.scl_rise() {
            return Err(code::BUS_ERROR);
        }
        if high && self.sda.is_low() {
            return Err(code::ARB_LOST);
        }
        self.half();
        self.scl.drive_low();
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, u8> {
        self.sda.release();
        self.half();
        if !self.scl_rise() {
            return Err(code::BUS_ERROR);
        }
        let bit = self.sda.is_high();
        self.half();
        self.scl.drive_low();
        Ok(bit)
    }

    /// Shift a byte out and return whether the device acknowledged
    fn shift_out(&mut self, byte: u8) -> Result<bool, u8> {
        for bit in (0..8).rev() {
            self.write_bit(byte & (1 << bit) != 0)?;
        }
        let nack = self.read_bit()?;
        Ok(!nack)
    }

    fn transmit(&mut self, byte: u8) -> u8 {
        let acked = match self.shift_out(byte) {
            Ok(acked) => acked,
            Err(raw) => return self.lose_bus(raw),
        };

        match self.mode {
            Mode::AwaitAddress if byte & 1 == 1 => {
                self.mode = Mode::Receiver;
                if acked {
                    code::MR_SLA_ACK
                } else {
                    code::MR_SLA_NACK
                }
            }
            Mode::AwaitAddress => {
                self.mode = Mode::Transmitter;
                if acked {
                    code::MT_SLA_ACK
                } else {
                    code::MT_SLA_NACK
                }
            }
            Mode::Transmitter if acked => code::MT_DATA_ACK,
            Mode::Transmitter => code::MT_DATA_NACK,
            Mode::Idle | Mode::Receiver => code::BUS_ERROR,
        }
    }

    fn receive(&mut self, ack: bool) -> u8 {
        if self.mode != Mode::Receiver {
            return code::BUS_ERROR;
        }

        let mut byte = 0u8;
        for _ in 0..8 {
            match self.read_bit() {
                Ok(bit) => byte = (byte << 1) | u8::from(bit),
                Err(raw) => return self.lose_bus(raw),
            }
        }
        self.data = byte;

        // ACK pulls SDA low during the ninth clock
        if let Err(raw) = self.write_bit(!ack) {
            return self.lose_bus(raw);
        }
        self.sda.release();

        if ack {
            code::MR_DATA_ACK
        } else {
            code::MR_DATA_NACK
        }
    }

    /// A clock that never rises means no STOP reached the wire; the
    /// stop stays pending and the status latches a bus error
    fn stop(&mut self) {
        self.sda.drive_low();
        self.half();
        let risen = self.scl_rise();
        self.half();
        self.sda.release();
        self.half();
        self.held = false;
        self.mode = Mode::Idle;
        self.stop_pending = true;
        if !risen {
            self.stop_failed = true;
            self.status = code::BUS_ERROR;
        }
    }
}

impl<SCL, SDA, D> TwiHardware for BitBangTwi<SCL, SDA, D>
where
    SCL: OpenDrainPin,
    SDA: OpenDrainPin,
    D: DelayNs,
{
    fn enable(&mut self, config: &TwiConfig) {
        self.half_period_us = config.half_period_us();
        self.scl.release();
        self.sda.release();
        self.enabled = true;
        self.held = false;
        self.mode = Mode::Idle;
    }

    fn disable(&mut self) {
        self.scl.release();
        self.sda.release();
        self.enabled = false;
        self.held = false;
        self.mode = Mode::Idle;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn issue(&mut self, command: TwiCommand) {
        self.complete = false;
        self.stop_pending = false;
        self.stop_failed = false;
        match command {
            TwiCommand::Stop => self.stop(),
            TwiCommand::Start => {
                self.status = self.start();
                self.complete = true;
            }
            TwiCommand::Transmit(byte) => {
                self.status = self.transmit(byte);
                self.complete = true;
            }
            TwiCommand::Receive { ack } => {
                self.status = self.receive(ack);
                self.complete = true;
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    /// The STOP has been signalled once SDA reads high again
    fn is_stop_pending(&self) -> bool {
        self.stop_pending && (self.stop_failed || self.sda.is_low())
    }

    fn status(&self) -> u8 {
        self.status
    }

    fn data(&self) -> u8 {
        self.data
    }
}
