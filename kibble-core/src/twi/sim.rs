//! Simulated TWI peripheral
//!
//! Behaves like the AVR TWI unit in master mode with at most one device
//! on the bus. The device is a register file with an auto-incrementing
//! pointer, which is how the DS1307 and most small I2C peripherals
//! behave: the first byte of a write sets the pointer, following bytes
//! are stored, and reads stream out from the pointer.
//!
//! Every bus phase is appended to an event log so tests can assert on
//! the exact byte sequence seen on the wire.

use heapless::Vec;
use kibble_hal::twi::{code, TwiCommand, TwiConfig, TwiHardware};

/// Events retained in the log
pub const LOG_CAPACITY: usize = 128;

/// Size of the simulated register file (DS1307: 8 clock + 56 RAM)
pub const REGISTER_COUNT: usize = 64;

/// One phase observed on the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// START from an idle bus
    Start,
    /// START while the bus was held
    RepeatedStart,
    /// Address byte (7-bit address shifted, R/W in bit 0)
    Address(u8),
    /// Data byte written by the master
    Write(u8),
    /// Data byte read by the master and the acknowledge it returned
    Read {
        /// Byte on the wire
        byte: u8,
        /// Master answered ACK
        ack: bool,
    },
    /// STOP
    Stop,
}

/// Register-file device attached to the simulated bus
#[derive(Debug, Clone)]
pub struct SimDevice {
    address: u8,
    registers: [u8; REGISTER_COUNT],
    pointer: usize,
    expect_pointer: bool,
    accepted: usize,
    write_limit: Option<usize>,
}

impl SimDevice {
    /// Create a device answering at `address`, registers zeroed
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; REGISTER_COUNT],
            pointer: 0,
            expect_pointer: false,
            accepted: 0,
            write_limit: None,
        }
    }

    /// 7-bit address of the device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Register contents
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    /// Mutable register contents
    pub fn registers_mut(&mut self) -> &mut [u8; REGISTER_COUNT] {
        &mut self.registers
    }

    /// Current register pointer
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// NACK every written byte after the first `count` of a transfer
    pub fn nack_writes_after(&mut self, count: usize) {
        self.write_limit = Some(count);
    }

    fn begin_write(&mut self) {
        self.expect_pointer = true;
        self.accepted = 0;
    }

    fn accept(&mut self, byte: u8) -> bool {
        if let Some(limit) = self.write_limit {
            if self.accepted >= limit {
                return false;
            }
        }
        self.accepted += 1;

        if self.expect_pointer {
            self.pointer = usize::from(byte) % REGISTER_COUNT;
            self.expect_pointer = false;
        } else {
            if let Some(slot) = self.registers.get_mut(self.pointer) {
                *slot = byte;
            }
            self.pointer = (self.pointer + 1) % REGISTER_COUNT;
        }
        true
    }

    fn emit(&mut self) -> u8 {
        let byte = self.registers.get(self.pointer).copied().unwrap_or(0xFF);
        self.pointer = (self.pointer + 1) % REGISTER_COUNT;
        byte
    }
}

/// Master-mode position of the simulated peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    AwaitAddress,
    Transmitter,
    Receiver,
    Unaddressed,
}

/// Simulated TWI peripheral
#[derive(Debug, Clone)]
pub struct SimTwi {
    enabled: bool,
    device: Option<SimDevice>,
    log: Vec<BusEvent, LOG_CAPACITY>,
    mode: Mode,
    held: bool,
    complete: bool,
    stop_pending: bool,
    status: u8,
    data: u8,
    start_fault: Option<u8>,
    freeze_after: Option<usize>,
    commands: usize,
}

impl Default for SimTwi {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTwi {
    /// Empty bus: every address is NACKed
    pub fn new() -> Self {
        Self {
            enabled: false,
            device: None,
            log: Vec::new(),
            mode: Mode::Idle,
            held: false,
            complete: false,
            stop_pending: false,
            status: code::NO_INFO,
            data: 0xFF,
            start_fault: None,
            freeze_after: None,
            commands: 0,
        }
    }

    /// Bus with one device attached
    pub fn with_device(device: SimDevice) -> Self {
        let mut sim = Self::new();
        sim.device = Some(device);
        sim
    }

    /// Attached device
    pub fn device(&self) -> Option<&SimDevice> {
        self.device.as_ref()
    }

    /// Phases observed so far
    pub fn log(&self) -> &[BusEvent] {
        &self.log
    }

    /// Forget the observed phases
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Make every START complete with `raw` instead of a start code
    pub fn fail_start_with(&mut self, raw: u8) {
        self.start_fault = Some(raw);
    }

    /// Stop raising the completion flag after `count` more commands
    pub fn freeze_after(&mut self, count: usize) {
        self.freeze_after = Some(self.commands + count);
    }

    /// Number of addresses seen, counting repeated phases
    pub fn address_phases(&self) -> usize {
        self.log
            .iter()
            .filter(|e| matches!(e, BusEvent::Address(_)))
            .count()
    }

    fn record(&mut self, event: BusEvent) {
        // Full logs drop further events rather than panic
        let _ = self.log.push(event);
    }

    fn frozen(&self) -> bool {
        self.freeze_after
            .map(|limit| self.commands > limit)
            .unwrap_or(false)
    }

    fn start(&mut self) -> u8 {
        self.record(if self.held {
            BusEvent::RepeatedStart
        } else {
            BusEvent::Start
        });

        if let Some(raw) = self.start_fault {
            return raw;
        }

        let raw = if self.held {
            code::REPEATED_START
        } else {
            code::START
        };
        self.held = true;
        self.mode = Mode::AwaitAddress;
        raw
    }

    fn address(&mut self, byte: u8) -> u8 {
        self.record(BusEvent::Address(byte));
        let read = byte & 1 == 1;
        let target = byte >> 1;

        let present = match self.device.as_mut() {
            Some(device) if device.address == target => {
                if !read {
                    device.begin_write();
                }
                true
            }
            _ => false,
        };

        match (present, read) {
            (true, true) => {
                self.mode = Mode::Receiver;
                code::MR_SLA_ACK
            }
            (true, false) => {
                self.mode = Mode::Transmitter;
                code::MT_SLA_ACK
            }
            (false, true) => {
                self.mode = Mode::Unaddressed;
                code::MR_SLA_NACK
            }
            (false, false) => {
                self.mode = Mode::Unaddressed;
                code::MT_SLA_NACK
            }
        }
    }

    fn transmit(&mut self, byte: u8) -> u8 {
        match self.mode {
            Mode::AwaitAddress => self.address(byte),
            Mode::Transmitter => {
                self.record(BusEvent::Write(byte));
                let acked = self
                    .device
                    .as_mut()
                    .map(|device| device.accept(byte))
                    .unwrap_or(false);
                if acked {
                    code::MT_DATA_ACK
                } else {
                    code::MT_DATA_NACK
                }
            }
            Mode::Unaddressed => {
                self.record(BusEvent::Write(byte));
                code::MT_DATA_NACK
            }
            Mode::Idle | Mode::Receiver => code::BUS_ERROR,
        }
    }

    fn receive(&mut self, ack: bool) -> u8 {
        if self.mode != Mode::Receiver {
            return code::BUS_ERROR;
        }
        let byte = self
            .device
            .as_mut()
            .map(|device| device.emit())
            .unwrap_or(0xFF);
        self.data = byte;
        self.record(BusEvent::Read { byte, ack });
        if ack {
            code::MR_DATA_ACK
        } else {
            code::MR_DATA_NACK
        }
    }
}

impl TwiHardware for SimTwi {
    fn enable(&mut self, _config: &TwiConfig) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.held = false;
        self.mode = Mode::Idle;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn issue(&mut self, command: TwiCommand) {
        self.commands += 1;
        self.complete = false;

        if command == TwiCommand::Stop {
            self.record(BusEvent::Stop);
            self.held = false;
            self.mode = Mode::Idle;
            self.stop_pending = self.frozen();
            if !self.stop_pending {
                self.status = code::NO_INFO;
            }
            return;
        }

        if self.frozen() {
            return;
        }

        self.status = match command {
            TwiCommand::Start => self.start(),
            TwiCommand::Transmit(byte) => self.transmit(byte),
            TwiCommand::Receive { ack } => self.receive(ack),
            TwiCommand::Stop => code::NO_INFO,
        };
        self.complete = true;
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn is_stop_pending(&self) -> bool {
        self.stop_pending
    }

    fn status(&self) -> u8 {
        self.status
    }

    fn data(&self) -> u8 {
        self.data
    }
}
