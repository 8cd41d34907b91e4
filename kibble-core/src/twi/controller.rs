//! Bus controller
//!
//! Owns the one TWI peripheral and the only piece of mutable bus state:
//! whether a transaction is currently holding the bus. Each method is one
//! bus primitive (START, address, one data byte, STOP) and reports exactly
//! one [`TwiStatus`].

use kibble_hal::twi::{code, Direction, TwiCommand, TwiConfig, TwiHardware};

use super::status::TwiStatus;

/// Whether the bus is held by a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// No transaction; the next START is a fresh start
    Idle,
    /// START issued and not yet stopped; the next START is a repeated start
    InTransaction,
}

/// Acknowledge sent after a received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckPolicy {
    /// Keep reading
    Ack,
    /// This is the final byte
    Nack,
}

/// How long to poll a hardware flag before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Poll until the flag changes. A silent device hangs the caller.
    #[default]
    Forever,
    /// Poll at most this many times, then force a STOP and report
    /// [`TwiStatus::Timeout`]
    Spins(u32),
}

impl WaitPolicy {
    /// Build from a spin budget where 0 means "wait forever"
    pub const fn from_spins(spins: u32) -> Self {
        if spins == 0 {
            WaitPolicy::Forever
        } else {
            WaitPolicy::Spins(spins)
        }
    }
}

/// TWI bus master primitives
pub struct BusController<H> {
    hw: H,
    config: TwiConfig,
    wait: WaitPolicy,
    state: BusState,
    last_code: u8,
}

impl<H: TwiHardware> BusController<H> {
    /// Wrap a peripheral; call [`BusController::init`] before use
    pub fn new(hw: H, config: TwiConfig, wait: WaitPolicy) -> Self {
        Self {
            hw,
            config,
            wait,
            state: BusState::Idle,
            last_code: code::NO_INFO,
        }
    }

    /// Current bus state
    pub fn state(&self) -> BusState {
        self.state
    }

    /// Raw status code of the last completed phase
    pub fn last_code(&self) -> u8 {
        self.last_code
    }

    /// Configured wait policy
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Borrow the peripheral
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutably borrow the peripheral
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Give the peripheral back
    pub fn release(self) -> H {
        self.hw
    }

    /// Enable the peripheral
    ///
    /// Returns [`TwiStatus::BusError`] if it was already enabled.
    pub fn init(&mut self) -> TwiStatus {
        if self.hw.is_enabled() {
            return TwiStatus::BusError;
        }
        self.hw.enable(&self.config);
        self.state = BusState::Idle;
        TwiStatus::Ok
    }

    /// Signal START, or a repeated START while in a transaction
    ///
    /// A bus error forces a STOP before returning.
    pub fn start(&mut self) -> TwiStatus {
        if let Some(timeout) = self.exchange(TwiCommand::Start) {
            return timeout;
        }

        match self.last_code {
            code::START | code::REPEATED_START => {
                self.state = BusState::InTransaction;
                TwiStatus::Ok
            }
            code::BUS_ERROR => {
                self.stop();
                TwiStatus::BusError
            }
            code::ARB_LOST => {
                self.state = BusState::Idle;
                TwiStatus::ArbitrationLost
            }
            _ => TwiStatus::StartFailed,
        }
    }

    /// Transmit the device address with the R/W bit appended
    pub fn address(&mut self, address: u8, direction: Direction) -> TwiStatus {
        if let Some(timeout) = self.exchange(TwiCommand::Transmit(direction.address_byte(address))) {
            return timeout;
        }
        self.decode()
    }

    /// Transmit one data byte
    pub fn transmit(&mut self, byte: u8) -> TwiStatus {
        if let Some(timeout) = self.exchange(TwiCommand::Transmit(byte)) {
            return timeout;
        }
        self.decode()
    }

    /// Receive one data byte, answering with `ack`
    ///
    /// The byte is only meaningful when the status is
    /// [`TwiStatus::DataAck`] or [`TwiStatus::DataNack`].
    pub fn receive(&mut self, ack: AckPolicy) -> (TwiStatus, u8) {
        let command = TwiCommand::Receive {
            ack: ack == AckPolicy::Ack,
        };
        if let Some(timeout) = self.exchange(command) {
            return (timeout, 0);
        }
        (self.decode(), self.hw.data())
    }

    /// Signal STOP and wait for the peripheral to release the bus
    pub fn stop(&mut self) -> TwiStatus {
        self.hw.issue(TwiCommand::Stop);
        let released = self.wait_until(|hw| !hw.is_stop_pending());
        self.state = BusState::Idle;
        if released {
            TwiStatus::Ok
        } else {
            TwiStatus::Timeout
        }
    }

    /// Disable the peripheral
    pub fn close(&mut self) {
        self.hw.disable();
        self.state = BusState::Idle;
    }

    /// Issue a command and wait for the completion flag
    ///
    /// Returns `Some(Timeout)` after forcing a STOP when the bounded wait
    /// expires, `None` once the status code has been latched.
    fn exchange(&mut self, command: TwiCommand) -> Option<TwiStatus> {
        self.hw.issue(command);
        if !self.wait_until(|hw| hw.is_complete()) {
            self.stop();
            return Some(TwiStatus::Timeout);
        }
        self.last_code = self.hw.status() & code::STATUS_MASK;
        None
    }

    /// Decode the latched code; losing arbitration releases the bus
    fn decode(&mut self) -> TwiStatus {
        let status = TwiStatus::from_code(self.last_code);
        if status == TwiStatus::ArbitrationLost {
            self.state = BusState::Idle;
        }
        status
    }

    fn wait_until(&self, ready: impl Fn(&H) -> bool) -> bool {
        match self.wait {
            WaitPolicy::Forever => {
                while !ready(&self.hw) {
                    core::hint::spin_loop();
                }
                true
            }
            WaitPolicy::Spins(limit) => {
                for _ in 0..limit {
                    if ready(&self.hw) {
                        return true;
                    }
                    core::hint::spin_loop();
                }
                ready(&self.hw)
            }
        }
    }
}
