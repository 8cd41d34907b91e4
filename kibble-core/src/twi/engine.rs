//! Transaction engine
//!
//! Drives the [`BusController`] primitives through the fixed transaction
//! shape: START, address phase, N data bytes, STOP. The shape is a closed
//! [`Phase`] enum advanced by [`TransactionEngine::step`]:
//!
//! ```text
//! Starting ──ok──▶ Addressing ──ack──▶ Data(0) ─▶ Data(1) ─▶ … ─▶ Data(n)
//!    │                 │                  │                        │
//!    │ fail            │ nack/fail        │ fail                   │ done
//!    ▼                 ▼                  ▼                        ▼
//!  Done ◀────────── Stopping ◀───────────┴────────────────────────┘
//! ```
//!
//! A segment that is part of a longer transaction finishes its data
//! phase without stopping, so the next segment's START goes out as a
//! repeated start.

use embedded_hal::i2c::{ErrorType, I2c, Operation};
use kibble_hal::twi::{Direction, TwiBus, TwiConfig, TwiHardware};

use super::controller::{AckPolicy, BusController, BusState, WaitPolicy};
use super::status::{TwiError, TwiStatus};

/// Position within one transaction segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Claiming the bus (START or repeated START)
    Starting,
    /// Sending the device address
    Addressing,
    /// Exchanging the data byte at this index
    Data(usize),
    /// Releasing the bus, then reporting the carried result
    Stopping(Result<(), TwiError>),
    /// Rest state: report the result
    Done(Result<(), TwiError>),
}

/// Data phase of one segment
enum Job<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl Job<'_> {
    fn direction(&self) -> Direction {
        match self {
            Job::Read(_) => Direction::Read,
            Job::Write(_) => Direction::Write,
        }
    }

    fn len(&self) -> usize {
        match self {
            Job::Read(buf) => buf.len(),
            Job::Write(bytes) => bytes.len(),
        }
    }
}

/// Framing of one segment within a transaction
#[derive(Debug, Clone, Copy)]
struct Segment {
    address: u8,
    /// Issue START + address before the data phase
    open: bool,
    /// NACK the final byte of a read
    nack_last: bool,
    /// STOP after the data phase
    release: bool,
}

impl Segment {
    fn whole(address: u8) -> Self {
        Self {
            address,
            open: true,
            nack_last: true,
            release: true,
        }
    }
}

/// TWI master transactions on top of a [`BusController`]
pub struct TransactionEngine<H> {
    bus: BusController<H>,
}

impl<H: TwiHardware> TransactionEngine<H> {
    /// Build an engine owning the peripheral
    pub fn new(hw: H, config: TwiConfig, wait: WaitPolicy) -> Self {
        Self::from_controller(BusController::new(hw, config, wait))
    }

    /// Build an engine from an existing controller
    pub fn from_controller(bus: BusController<H>) -> Self {
        Self { bus }
    }

    /// Borrow the underlying controller
    pub fn controller(&self) -> &BusController<H> {
        &self.bus
    }

    /// Mutably borrow the underlying controller
    pub fn controller_mut(&mut self) -> &mut BusController<H> {
        &mut self.bus
    }

    /// Give the peripheral back
    pub fn release(self) -> H {
        self.bus.release()
    }

    /// Current bus state
    pub fn state(&self) -> BusState {
        self.bus.state()
    }

    /// Enable the bus
    pub fn init(&mut self) -> TwiStatus {
        self.bus.init()
    }

    /// Force a STOP and return the bus to idle
    pub fn stop(&mut self) -> TwiStatus {
        self.bus.stop()
    }

    /// Disable the bus
    pub fn close(&mut self) {
        self.bus.close()
    }

    /// Read `buf.len()` bytes from `address`
    ///
    /// Every byte but the last is acknowledged; the last is NACKed to tell
    /// the device to stop sending. `buf` is only fully valid on `Ok`.
    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), TwiError> {
        self.run(Segment::whole(address), &mut Job::Read(buf))
    }

    /// Write `bytes` to `address`, requiring an ACK for each
    pub fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), TwiError> {
        self.run(Segment::whole(address), &mut Job::Write(bytes))
    }

    /// Write then read with a repeated start in between
    pub fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buf: &mut [u8],
    ) -> Result<(), TwiError> {
        let write = Segment {
            release: false,
            ..Segment::whole(address)
        };
        self.run(write, &mut Job::Write(bytes))?;
        self.run(Segment::whole(address), &mut Job::Read(buf))
    }

    /// Execute operations as one transaction
    ///
    /// Adjacent operations in the same direction share one address phase;
    /// a change of direction is a repeated start. Only the last byte of a
    /// run of reads is NACKed. The bus is stopped once, at the end, or at
    /// the first failure.
    pub fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TwiError> {
        let count = operations.len();
        let mut previous: Option<Direction> = None;

        for index in 0..count {
            let more_reads = operations
                .get(index + 1..)
                .is_some_and(read_bytes_follow);
            let Some(op) = operations.get_mut(index) else {
                break;
            };
            let direction = op_direction(op);

            let segment = Segment {
                address,
                open: previous != Some(direction),
                nack_last: !more_reads,
                release: index + 1 == count,
            };
            let mut job = match op {
                Operation::Read(buf) => Job::Read(&mut **buf),
                Operation::Write(bytes) => Job::Write(*bytes),
            };
            self.run(segment, &mut job)?;
            previous = Some(direction);
        }
        Ok(())
    }

    fn run(&mut self, segment: Segment, job: &mut Job<'_>) -> Result<(), TwiError> {
        let mut phase = if segment.open {
            Phase::Starting
        } else {
            Phase::Data(0)
        };
        loop {
            match phase {
                Phase::Done(result) => return result,
                _ => phase = self.step(phase, &segment, job),
            }
        }
    }

    /// Advance one phase
    fn step(&mut self, phase: Phase, segment: &Segment, job: &mut Job<'_>) -> Phase {
        match phase {
            Phase::Starting => match self.bus.start() {
                TwiStatus::Ok => Phase::Addressing,
                status => self.fail(status),
            },

            Phase::Addressing => match self.bus.address(segment.address, job.direction()) {
                TwiStatus::AddressAck => Phase::Data(0),
                status => self.fail(status),
            },

            Phase::Data(index) if index >= job.len() => {
                if segment.release {
                    Phase::Stopping(Ok(()))
                } else {
                    Phase::Done(Ok(()))
                }
            }

            Phase::Data(index) => match job {
                Job::Read(buf) => {
                    let last = index + 1 == buf.len();
                    let ack = if last && segment.nack_last {
                        AckPolicy::Nack
                    } else {
                        AckPolicy::Ack
                    };
                    match self.bus.receive(ack) {
                        (TwiStatus::DataAck | TwiStatus::DataNack, byte) => {
                            if let Some(slot) = buf.get_mut(index) {
                                *slot = byte;
                            }
                            Phase::Data(index + 1)
                        }
                        (status, _) => self.fail(status),
                    }
                }
                Job::Write(bytes) => {
                    let byte = bytes.get(index).copied().unwrap_or_default();
                    match self.bus.transmit(byte) {
                        TwiStatus::DataAck => Phase::Data(index + 1),
                        status => self.fail(status),
                    }
                }
            },

            Phase::Stopping(result) => {
                let stopped = self.bus.stop();
                match (result, stopped) {
                    (Ok(()), TwiStatus::Ok) => Phase::Done(Ok(())),
                    (Ok(()), status) => Phase::Done(Err(status.into_error(self.bus.last_code()))),
                    (Err(e), _) => Phase::Done(Err(e)),
                }
            }

            Phase::Done(result) => Phase::Done(result),
        }
    }

    /// Route a failed primitive to `Stopping` while the bus is still held
    fn fail(&self, status: TwiStatus) -> Phase {
        let error = status.into_error(self.bus.last_code());
        match self.bus.state() {
            BusState::InTransaction => Phase::Stopping(Err(error)),
            BusState::Idle => Phase::Done(Err(error)),
        }
    }
}

/// Whether the run of reads at the start of `rest` transfers any byte
fn read_bytes_follow(rest: &[Operation<'_>]) -> bool {
    rest.iter()
        .take_while(|op| matches!(op, Operation::Read(_)))
        .any(|op| matches!(op, Operation::Read(buf) if !buf.is_empty()))
}

fn op_direction(op: &Operation<'_>) -> Direction {
    match op {
        Operation::Read(_) => Direction::Read,
        Operation::Write(_) => Direction::Write,
    }
}

impl<H: TwiHardware> TwiBus for TransactionEngine<H> {
    type Error = TwiError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        TransactionEngine::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        TransactionEngine::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        TransactionEngine::write_read(self, address, write_data, read_buf)
    }
}

impl<H: TwiHardware> ErrorType for TransactionEngine<H> {
    type Error = TwiError;
}

impl<H: TwiHardware> I2c for TransactionEngine<H> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        TransactionEngine::transaction(self, address, operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twi::sim::{BusEvent, SimDevice, SimTwi};
    use kibble_hal::twi::code;

    const RTC: u8 = 0x68;

    fn engine(sim: SimTwi) -> TransactionEngine<SimTwi> {
        let mut engine = TransactionEngine::new(sim, TwiConfig::STANDARD, WaitPolicy::Spins(16));
        assert_eq!(engine.init(), TwiStatus::Ok);
        engine
    }

    fn rtc_with(registers: &[u8]) -> SimTwi {
        let mut device = SimDevice::new(RTC);
        device.registers_mut()[..registers.len()].copy_from_slice(registers);
        SimTwi::with_device(device)
    }

    fn log(engine: &TransactionEngine<SimTwi>) -> &[BusEvent] {
        engine.controller().hardware().log()
    }

    #[test]
    fn test_no_device_address_nack() {
        let mut engine = engine(SimTwi::new());
        let mut buf = [0u8; 8];

        assert_eq!(engine.read(RTC, &mut buf), Err(TwiError::AddressNack));
        assert_eq!(engine.state(), BusState::Idle);
        assert_eq!(
            log(&engine),
            &[BusEvent::Start, BusEvent::Address(0xD1), BusEvent::Stop]
        );
    }

    #[test]
    fn test_next_call_after_nack_is_fresh_start() {
        let mut engine = engine(SimTwi::new());
        let _ = engine.write(RTC, &[0x00]);
        engine.controller_mut().hardware_mut().clear_log();

        let _ = engine.write(RTC, &[0x00]);
        assert_eq!(log(&engine).first(), Some(&BusEvent::Start));
    }

    #[test]
    fn test_read_nacks_only_last_byte() {
        let mut engine = engine(rtc_with(&[1, 2, 3, 4]));
        let mut buf = [0u8; 4];

        assert_eq!(engine.read(RTC, &mut buf), Ok(()));
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(
            log(&engine),
            &[
                BusEvent::Start,
                BusEvent::Address(0xD1),
                BusEvent::Read { byte: 1, ack: true },
                BusEvent::Read { byte: 2, ack: true },
                BusEvent::Read { byte: 3, ack: true },
                BusEvent::Read { byte: 4, ack: false },
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_single_byte_read_is_nacked() {
        let mut engine = engine(rtc_with(&[0x42]));
        let mut buf = [0u8; 1];

        assert_eq!(engine.read(RTC, &mut buf), Ok(()));
        assert_eq!(buf, [0x42]);
        assert!(log(&engine).contains(&BusEvent::Read {
            byte: 0x42,
            ack: false
        }));
    }

    #[test]
    fn test_write_sets_pointer_and_registers() {
        let mut engine = engine(rtc_with(&[]));

        assert_eq!(engine.write(RTC, &[0x07, 0x90]), Ok(()));
        let device = engine.controller().hardware().device().unwrap();
        assert_eq!(device.registers()[7], 0x90);
        assert_eq!(device.pointer(), 8);
        assert_eq!(
            log(&engine),
            &[
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x07),
                BusEvent::Write(0x90),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_write_data_nack_aborts() {
        let mut device = SimDevice::new(RTC);
        device.nack_writes_after(1);
        let mut engine = engine(SimTwi::with_device(device));

        assert_eq!(engine.write(RTC, &[0x07, 0x90, 0x55]), Err(TwiError::DataNack));
        assert_eq!(engine.state(), BusState::Idle);
        // Third byte never sent
        assert_eq!(
            log(&engine),
            &[
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x07),
                BusEvent::Write(0x90),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_zero_length_is_ok() {
        let mut engine = engine(rtc_with(&[]));

        assert_eq!(engine.write(RTC, &[]), Ok(()));
        assert_eq!(engine.read(RTC, &mut []), Ok(()));
        assert_eq!(engine.state(), BusState::Idle);
    }

    #[test]
    fn test_start_failure_is_propagated() {
        let mut sim = rtc_with(&[]);
        sim.fail_start_with(code::NO_INFO);
        let mut engine = engine(sim);

        assert_eq!(engine.write(RTC, &[0]), Err(TwiError::StartFailed));
        assert_eq!(engine.controller().hardware().address_phases(), 0);
    }

    #[test]
    fn test_bus_error_on_start_stops_once() {
        let mut sim = rtc_with(&[]);
        sim.fail_start_with(code::BUS_ERROR);
        let mut engine = engine(sim);

        assert_eq!(engine.write(RTC, &[0]), Err(TwiError::BusError));
        assert_eq!(log(&engine), &[BusEvent::Start, BusEvent::Stop]);
        assert_eq!(engine.state(), BusState::Idle);
    }

    #[test]
    fn test_timeout_mid_read() {
        let mut sim = rtc_with(&[1, 2, 3]);
        // START and address complete, first data byte hangs
        sim.freeze_after(2);
        let mut engine = engine(sim);
        let mut buf = [0u8; 3];

        assert_eq!(engine.read(RTC, &mut buf), Err(TwiError::Timeout));
        assert_eq!(engine.state(), BusState::Idle);
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let mut engine = engine(rtc_with(&[0, 0, 0, 0xAA, 0xBB]));
        let mut buf = [0u8; 2];

        assert_eq!(engine.write_read(RTC, &[0x03], &mut buf), Ok(()));
        assert_eq!(buf, [0xAA, 0xBB]);
        assert_eq!(
            log(&engine),
            &[
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x03),
                BusEvent::RepeatedStart,
                BusEvent::Address(0xD1),
                BusEvent::Read { byte: 0xAA, ack: true },
                BusEvent::Read { byte: 0xBB, ack: false },
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_transaction_merges_same_direction() {
        let mut engine = engine(rtc_with(&[0, 0x10, 0x20, 0x30]));
        let mut first = [0u8; 1];
        let mut second = [0u8; 2];
        let mut ops = [
            Operation::Write(&[0x01]),
            Operation::Read(&mut first),
            Operation::Read(&mut second),
        ];

        assert_eq!(TransactionEngine::transaction(&mut engine, RTC, &mut ops), Ok(()));
        assert_eq!(first, [0x10]);
        assert_eq!(second, [0x20, 0x30]);
        assert_eq!(engine.controller().hardware().address_phases(), 2);
        assert_eq!(
            &log(&engine)[5..],
            &[
                BusEvent::Read { byte: 0x10, ack: true },
                BusEvent::Read { byte: 0x20, ack: true },
                BusEvent::Read { byte: 0x30, ack: false },
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_transaction_trailing_empty_read_still_nacks() {
        let mut engine = engine(rtc_with(&[0x11, 0x22]));
        let mut buf = [0u8; 1];
        let mut empty = [0u8; 0];
        let mut ops = [Operation::Read(&mut buf), Operation::Read(&mut empty)];

        assert_eq!(TransactionEngine::transaction(&mut engine, RTC, &mut ops), Ok(()));
        assert_eq!(buf, [0x11]);
        assert_eq!(
            log(&engine),
            &[
                BusEvent::Start,
                BusEvent::Address(0xD1),
                BusEvent::Read { byte: 0x11, ack: false },
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_transaction_empty_read_between_reads_keeps_ack() {
        let mut engine = engine(rtc_with(&[0x11, 0x22]));
        let mut first = [0u8; 1];
        let mut empty = [0u8; 0];
        let mut last = [0u8; 1];
        let mut ops = [
            Operation::Read(&mut first),
            Operation::Read(&mut empty),
            Operation::Read(&mut last),
        ];

        assert_eq!(TransactionEngine::transaction(&mut engine, RTC, &mut ops), Ok(()));
        assert_eq!(
            &log(&engine)[2..],
            &[
                BusEvent::Read { byte: 0x11, ack: true },
                BusEvent::Read { byte: 0x22, ack: false },
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_transaction_failure_stops_bus() {
        let mut engine = engine(SimTwi::new());
        let mut buf = [0u8; 1];
        let mut ops = [Operation::Write(&[0x00]), Operation::Read(&mut buf)];

        assert_eq!(
            TransactionEngine::transaction(&mut engine, RTC, &mut ops),
            Err(TwiError::AddressNack)
        );
        assert_eq!(engine.state(), BusState::Idle);
        assert_eq!(log(&engine).last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn test_embedded_hal_write_read() {
        let mut engine = engine(rtc_with(&[0x59]));
        let mut buf = [0u8; 1];

        I2c::write_read(&mut engine, RTC, &[0x00], &mut buf).unwrap();
        assert_eq!(buf, [0x59]);
        assert_eq!(engine.state(), BusState::Idle);
    }

    #[test]
    fn test_step_done_is_absorbing() {
        let mut engine = engine(SimTwi::new());
        let segment = Segment::whole(RTC);
        let mut job = Job::Write(&[]);
        let done = Phase::Done(Err(TwiError::BusError));

        assert_eq!(engine.step(done, &segment, &mut job), done);
    }
}
