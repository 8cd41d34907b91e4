//! Bus status interpretation
//!
//! Every bus primitive reports exactly one [`TwiStatus`]. Whole
//! transactions report success as `Ok(())` and failure as a [`TwiError`],
//! the error subset of the status set.

use kibble_hal::twi::code;

/// Outcome of a single bus primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiStatus {
    /// Phase completed as requested (START, repeated START, STOP)
    Ok,
    /// The bus could not be claimed
    StartFailed,
    /// Illegal START/STOP seen on the bus
    BusError,
    /// Device acknowledged its address
    AddressAck,
    /// No device answered the address, or it is busy
    AddressNack,
    /// Data byte exchanged, ACK on the wire
    DataAck,
    /// Data byte exchanged, NACK on the wire
    DataNack,
    /// Another master won the bus
    ArbitrationLost,
    /// Completion flag never rose within the bounded wait
    Timeout,
    /// Status code outside the master-mode table
    Unknown(u8),
}

impl TwiStatus {
    /// Decode a masked hardware status code
    pub const fn from_code(raw: u8) -> Self {
        match raw & code::STATUS_MASK {
            code::START | code::REPEATED_START => TwiStatus::Ok,
            code::MT_SLA_ACK | code::MR_SLA_ACK => TwiStatus::AddressAck,
            code::MT_SLA_NACK | code::MR_SLA_NACK => TwiStatus::AddressNack,
            code::MT_DATA_ACK | code::MR_DATA_ACK => TwiStatus::DataAck,
            code::MT_DATA_NACK | code::MR_DATA_NACK => TwiStatus::DataNack,
            code::ARB_LOST => TwiStatus::ArbitrationLost,
            code::BUS_ERROR => TwiStatus::BusError,
            other => TwiStatus::Unknown(other),
        }
    }

    /// Convert to the error a transaction reports when this status
    /// arrives where a different one was expected
    ///
    /// Success-shaped statuses in the wrong phase are reported as
    /// [`TwiError::Unknown`] carrying the raw code.
    pub const fn into_error(self, raw: u8) -> TwiError {
        match self {
            TwiStatus::StartFailed => TwiError::StartFailed,
            TwiStatus::BusError => TwiError::BusError,
            TwiStatus::AddressNack => TwiError::AddressNack,
            TwiStatus::DataNack => TwiError::DataNack,
            TwiStatus::ArbitrationLost => TwiError::ArbitrationLost,
            TwiStatus::Timeout => TwiError::Timeout,
            TwiStatus::Unknown(code) => TwiError::Unknown(code),
            TwiStatus::Ok | TwiStatus::AddressAck | TwiStatus::DataAck => TwiError::Unknown(raw),
        }
    }
}

/// Failure of a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// The bus could not be claimed
    StartFailed,
    /// Electrical or protocol fault mid-transaction
    BusError,
    /// No responding device, or device busy
    AddressNack,
    /// Device refused a byte or terminated the transfer early
    DataNack,
    /// Multi-master contention detected
    ArbitrationLost,
    /// Bounded wait expired (only with [`super::WaitPolicy::Spins`])
    Timeout,
    /// Unrecognized hardware status
    Unknown(u8),
}

impl From<TwiError> for TwiStatus {
    fn from(e: TwiError) -> Self {
        match e {
            TwiError::StartFailed => TwiStatus::StartFailed,
            TwiError::BusError => TwiStatus::BusError,
            TwiError::AddressNack => TwiStatus::AddressNack,
            TwiError::DataNack => TwiStatus::DataNack,
            TwiError::ArbitrationLost => TwiStatus::ArbitrationLost,
            TwiError::Timeout => TwiStatus::Timeout,
            TwiError::Unknown(code) => TwiStatus::Unknown(code),
        }
    }
}

impl From<Result<(), TwiError>> for TwiStatus {
    fn from(result: Result<(), TwiError>) -> Self {
        match result {
            Ok(()) => TwiStatus::Ok,
            Err(e) => e.into(),
        }
    }
}

impl embedded_hal::i2c::Error for TwiError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            TwiError::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            TwiError::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            TwiError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            TwiError::BusError => ErrorKind::Bus,
            TwiError::StartFailed | TwiError::Timeout | TwiError::Unknown(_) => ErrorKind::Other,
        }
    }
}
