//! DS1307 real-time clock
//!
//! The DS1307 keeps BCD time in registers 0x00-0x06 and its square-wave
//! control byte at 0x07. Each register access is a pointer write followed
//! by a read or by more bytes written from that pointer.
//!
//! # Register map
//!
//! | reg | contents                        |
//! |-----|---------------------------------|
//! | 0   | CH (bit 7), seconds             |
//! | 1   | minutes                         |
//! | 2   | hours (24h mode)                |
//! | 3   | day of week, 1-7                |
//! | 4   | day of month, 1-31              |
//! | 5   | month, 1-12                     |
//! | 6   | year, 00-99                     |
//! | 7   | OUT (bit 7), SQWE (bit 4), RS1:0|

use kibble_core::time::CalendarTime;
use kibble_core::traits::{
    OutputLevel, RealTimeClock, SquareWave, SquareWaveEnable, SquareWaveFrequency,
};
use kibble_hal::twi::TwiBus;

use super::bcd;

/// Factory bus address
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Register offsets
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const MINUTES: u8 = 0x01;
    pub const HOURS: u8 = 0x02;
    pub const WEEKDAY: u8 = 0x03;
    pub const DAY: u8 = 0x04;
    pub const MONTH: u8 = 0x05;
    pub const YEAR: u8 = 0x06;
    pub const CONTROL: u8 = 0x07;
}

/// Bytes read for one time sample: the seven time registers and control
pub const TIME_BLOCK_LEN: usize = 8;

/// Clock-halt bit in the seconds register
pub const CLOCK_HALT: u8 = 0x80;

/// Control register bits
pub mod control {
    /// Output level while the square wave is disabled
    pub const OUT: u8 = 1 << 7;
    /// Square-wave enable
    pub const SQWE: u8 = 1 << 4;
    /// Rate-select mask
    pub const RS_MASK: u8 = 0x03;
}

/// Device years 00-99 land on 2000-2099 (years since 1900)
pub const YEAR_OFFSET: u16 = 100;

/// Build the control register byte
///
/// With the output disabled the byte is always 0x00, whatever the level
/// and rate.
pub const fn control_byte(
    enable: SquareWaveEnable,
    level: OutputLevel,
    frequency: SquareWaveFrequency,
) -> u8 {
    match enable {
        SquareWaveEnable::Off => 0x00,
        SquareWaveEnable::On => {
            let out = match level {
                OutputLevel::Low => 0,
                OutputLevel::High => control::OUT,
            };
            out | control::SQWE | (frequency.rate_select() & control::RS_MASK)
        }
    }
}

/// Decode the time registers
///
/// `regs` starts at register 0. Weekday and month are shifted to 0-based
/// and the year is moved onto the 1900 base.
pub const fn decode_time(regs: &[u8; TIME_BLOCK_LEN]) -> CalendarTime {
    CalendarTime {
        seconds: bcd::decode(regs[reg::SECONDS as usize] & !CLOCK_HALT),
        minutes: bcd::decode(regs[reg::MINUTES as usize]),
        hours: bcd::decode(regs[reg::HOURS as usize]),
        weekday: bcd::decode(regs[reg::WEEKDAY as usize]).wrapping_sub(1),
        day: bcd::decode(regs[reg::DAY as usize]),
        month: bcd::decode(regs[reg::MONTH as usize]).wrapping_sub(1),
        year: bcd::decode(regs[reg::YEAR as usize]) as u16 + YEAR_OFFSET,
    }
}

/// Encode a time as the pointer byte plus registers 0-6
///
/// The clock-halt bit is left clear so writing a time starts the clock.
pub const fn encode_time(time: &CalendarTime) -> [u8; 8] {
    [
        reg::SECONDS,
        bcd::encode(time.seconds),
        bcd::encode(time.minutes),
        bcd::encode(time.hours),
        bcd::encode(time.weekday.wrapping_add(1)),
        bcd::encode(time.day),
        bcd::encode(time.month.wrapping_add(1)),
        bcd::encode((time.year.saturating_sub(YEAR_OFFSET) % 100) as u8),
    ]
}

/// DS1307 driver
pub struct Ds1307<B> {
    bus: B,
    address: u8,
}

impl<B: TwiBus> Ds1307<B> {
    /// Driver at the factory address
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Read the current date and time
    ///
    /// Resets the register pointer with a one-byte write, then reads the
    /// whole time block in a separate transaction. Either failure is
    /// returned as is and no time is produced.
    pub fn read_time(&mut self) -> Result<CalendarTime, B::Error> {
        self.bus.write(self.address, &[reg::SECONDS])?;

        let mut regs = [0u8; TIME_BLOCK_LEN];
        self.bus.read(self.address, &mut regs)?;

        Ok(decode_time(&regs))
    }

    /// Program the square-wave output pin
    pub fn configure_square_wave(
        &mut self,
        enable: SquareWaveEnable,
        level: OutputLevel,
        frequency: SquareWaveFrequency,
    ) -> Result<(), B::Error> {
        let byte = control_byte(enable, level, frequency);
        self.bus.write(self.address, &[reg::CONTROL, byte])
    }

    /// Write a new date and time; this also clears clock-halt
    pub fn set_time(&mut self, time: &CalendarTime) -> Result<(), B::Error> {
        self.bus.write(self.address, &encode_time(time))
    }

    /// Whether the oscillator is running (clock-halt clear)
    pub fn is_running(&mut self) -> Result<bool, B::Error> {
        let mut seconds = [0u8; 1];
        self.bus
            .write_read(self.address, &[reg::SECONDS], &mut seconds)?;
        Ok(seconds[0] & CLOCK_HALT == 0)
    }
}

impl<B: TwiBus> RealTimeClock for Ds1307<B> {
    type Error = B::Error;

    fn now(&mut self) -> Result<CalendarTime, Self::Error> {
        self.read_time()
    }

    fn set(&mut self, time: &CalendarTime) -> Result<(), Self::Error> {
        self.set_time(time)
    }

    fn set_square_wave(&mut self, wave: SquareWave) -> Result<(), Self::Error> {
        self.configure_square_wave(wave.enable, wave.level, wave.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kibble_core::twi::sim::{BusEvent, SimDevice, SimTwi};
    use kibble_core::twi::{BusState, TransactionEngine, TwiError, WaitPolicy};
    use kibble_hal::twi::TwiConfig;

    type Rtc = Ds1307<TransactionEngine<SimTwi>>;

    const SAMPLE: [u8; 7] = [0x59, 0x59, 0x23, 0x03, 0x15, 0x12, 0x24];

    fn rtc(sim: SimTwi) -> Rtc {
        let mut engine = TransactionEngine::new(sim, TwiConfig::STANDARD, WaitPolicy::Spins(16));
        engine.init();
        Ds1307::new(engine)
    }

    fn clock_with(registers: &[u8]) -> Rtc {
        let mut device = SimDevice::new(DEFAULT_ADDRESS);
        device.registers_mut()[..registers.len()].copy_from_slice(registers);
        rtc(SimTwi::with_device(device))
    }

    fn sim(rtc: &Rtc) -> &SimTwi {
        rtc.bus().controller().hardware()
    }

    fn writes(rtc: &Rtc) -> heapless::Vec<u8, 16> {
        sim(rtc)
            .log()
            .iter()
            .filter_map(|e| match e {
                BusEvent::Write(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_read_time_decodes_sample() {
        let mut rtc = clock_with(&SAMPLE);
        let time = rtc.read_time().unwrap();

        assert_eq!(
            time,
            CalendarTime {
                seconds: 59,
                minutes: 59,
                hours: 23,
                weekday: 2,
                day: 15,
                month: 11,
                year: 124,
            }
        );
    }

    #[test]
    fn test_read_time_wire_sequence() {
        let mut rtc = clock_with(&SAMPLE);
        rtc.read_time().unwrap();

        let log = sim(&rtc).log();
        assert_eq!(
            &log[..4],
            &[
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x00),
                BusEvent::Stop,
            ]
        );
        assert_eq!(log[4], BusEvent::Start);
        assert_eq!(log[5], BusEvent::Address(0xD1));
        let reads = log
            .iter()
            .filter(|e| matches!(e, BusEvent::Read { .. }))
            .count();
        assert_eq!(reads, TIME_BLOCK_LEN);
    }

    #[test]
    fn test_clock_halt_masked() {
        let mut regs = SAMPLE;
        regs[0] = CLOCK_HALT | 0x42;
        let mut rtc = clock_with(&regs);
        assert_eq!(rtc.read_time().unwrap().seconds, 42);
    }

    #[test]
    fn test_device_zero_year_is_2000() {
        let mut regs = SAMPLE;
        regs[6] = 0x00;
        regs[3] = 0x01;
        regs[5] = 0x01;
        let time = clock_with(&regs).read_time().unwrap();
        assert_eq!(time.year, 100);
        assert_eq!(time.weekday, 0);
        assert_eq!(time.month, 0);
    }

    #[test]
    fn test_read_time_absent_device() {
        let mut rtc = rtc(SimTwi::new());
        assert_eq!(rtc.read_time(), Err(TwiError::AddressNack));
        assert_eq!(rtc.bus().state(), BusState::Idle);
        // Pointer write failed, so the read was never attempted
        assert_eq!(sim(&rtc).address_phases(), 1);
    }

    #[test]
    fn test_read_time_fails_on_read_phase() {
        let mut sim = {
            let mut device = SimDevice::new(DEFAULT_ADDRESS);
            device.registers_mut()[..7].copy_from_slice(&SAMPLE);
            SimTwi::with_device(device)
        };
        // Pointer write frame plus the read's START and address complete
        sim.freeze_after(6);
        let mut rtc = rtc(sim);

        assert_eq!(rtc.read_time(), Err(TwiError::Timeout));
    }

    #[test]
    fn test_square_wave_disabled_writes_zero() {
        let mut rtc = clock_with(&[]);
        rtc.configure_square_wave(
            SquareWaveEnable::Off,
            OutputLevel::High,
            SquareWaveFrequency::KHz32,
        )
        .unwrap();
        assert_eq!(writes(&rtc).as_slice(), &[0x07, 0x00]);
    }

    #[test]
    fn test_square_wave_enabled_8khz_high() {
        let mut rtc = clock_with(&[]);
        rtc.configure_square_wave(
            SquareWaveEnable::On,
            OutputLevel::High,
            SquareWaveFrequency::KHz8,
        )
        .unwrap();
        assert_eq!(writes(&rtc).as_slice(), &[0x07, 0x92]);
        let device = sim(&rtc).device().unwrap();
        assert_eq!(device.registers()[usize::from(reg::CONTROL)], 0x92);
    }

    #[test]
    fn test_control_byte_table() {
        use OutputLevel::*;
        use SquareWaveFrequency::*;

        for level in [Low, High] {
            for freq in [Hz1, KHz4, KHz8, KHz32] {
                assert_eq!(control_byte(SquareWaveEnable::Off, level, freq), 0x00);
            }
        }
        assert_eq!(control_byte(SquareWaveEnable::On, High, Hz1), 0x90);
        assert_eq!(control_byte(SquareWaveEnable::On, Low, KHz32), 0x13);
    }

    #[test]
    fn test_square_wave_write_failure() {
        let mut rtc = rtc(SimTwi::new());
        let result = rtc.set_square_wave(SquareWave::default());
        assert_eq!(result, Err(TwiError::AddressNack));
    }

    #[test]
    fn test_set_time_round_trip() {
        let mut rtc = clock_with(&[CLOCK_HALT]);
        let time = CalendarTime {
            seconds: 7,
            minutes: 30,
            hours: 18,
            weekday: 6,
            day: 31,
            month: 0,
            year: 125,
        };

        assert_eq!(rtc.is_running(), Ok(false));
        rtc.set_time(&time).unwrap();
        assert_eq!(rtc.is_running(), Ok(true));
        assert_eq!(rtc.now(), Ok(time));
    }
}
